use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of datasets the demo ships models for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetId {
    #[serde(rename = "mnist")]
    Mnist,
    #[serde(rename = "fashion-mnist")]
    FashionMnist,
    #[serde(rename = "cifar10")]
    Cifar10,
}

impl DatasetId {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetId::Mnist => "mnist",
            DatasetId::FashionMnist => "fashion-mnist",
            DatasetId::Cifar10 => "cifar10",
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel layout a model expects its input in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    Grayscale,
    Rgb,
}

impl ColorMode {
    pub fn channels(&self) -> usize {
        match self {
            ColorMode::Grayscale => 1,
            ColorMode::Rgb => 3,
        }
    }
}

/// Static metadata for one dataset's model: input geometry, class labels,
/// and where the serialized model lives.
#[derive(Clone, Debug, Serialize)]
pub struct ModelDescriptor {
    pub id: DatasetId,
    pub name: &'static str,
    pub description: &'static str,
    /// (width, height) of the model input.
    pub image_size: (u32, u32),
    pub color: ColorMode,
    /// Class labels in model output order.
    pub classes: &'static [&'static str],
    /// Local path or http(s) URL of the serialized model graph.
    pub model_path: &'static str,
}

impl ModelDescriptor {
    pub fn width(&self) -> u32 {
        self.image_size.0
    }

    pub fn height(&self) -> u32 {
        self.image_size.1
    }

    /// Expected tensor shape, batch dimension included.
    pub fn input_shape(&self) -> [usize; 4] {
        [
            1,
            self.height() as usize,
            self.width() as usize,
            self.color.channels(),
        ]
    }
}

/// A sample image shown in the dataset explorer.
#[derive(Clone, Debug, Serialize)]
pub struct DatasetExample {
    pub label: &'static str,
    pub image_url: &'static str,
}
