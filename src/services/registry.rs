//! Static registry mapping each dataset to its model metadata.

use crate::models::descriptor::{ColorMode, DatasetExample, DatasetId, ModelDescriptor};

pub const ALL_DATASETS: [DatasetId; 3] = [
    DatasetId::Mnist,
    DatasetId::FashionMnist,
    DatasetId::Cifar10,
];

static MNIST: ModelDescriptor = ModelDescriptor {
    id: DatasetId::Mnist,
    name: "MNIST Handwritten Digits",
    description: "Classifies handwritten digits from 0-9",
    image_size: (28, 28),
    color: ColorMode::Grayscale,
    classes: &["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"],
    model_path: "models/mnist.onnx",
};

static FASHION_MNIST: ModelDescriptor = ModelDescriptor {
    id: DatasetId::FashionMnist,
    name: "Fashion MNIST",
    description: "Classifies fashion items like shirts, shoes, etc.",
    image_size: (28, 28),
    color: ColorMode::Grayscale,
    classes: &[
        "T-shirt/top",
        "Trouser",
        "Pullover",
        "Dress",
        "Coat",
        "Sandal",
        "Shirt",
        "Sneaker",
        "Bag",
        "Ankle boot",
    ],
    model_path: "models/fashion-mnist.onnx",
};

static CIFAR10: ModelDescriptor = ModelDescriptor {
    id: DatasetId::Cifar10,
    name: "CIFAR-10",
    description: "Classifies 10 different types of objects",
    image_size: (32, 32),
    color: ColorMode::Rgb,
    classes: &[
        "Airplane",
        "Automobile",
        "Bird",
        "Cat",
        "Deer",
        "Dog",
        "Frog",
        "Horse",
        "Ship",
        "Truck",
    ],
    model_path: "models/cifar10.onnx",
};

/// Look up the static descriptor for a dataset. Total: every `DatasetId`
/// has exactly one entry.
pub fn describe(id: DatasetId) -> &'static ModelDescriptor {
    match id {
        DatasetId::Mnist => &MNIST,
        DatasetId::FashionMnist => &FASHION_MNIST,
        DatasetId::Cifar10 => &CIFAR10,
    }
}

/// Sample images shown in the dataset explorer panel.
pub fn examples(id: DatasetId) -> &'static [DatasetExample] {
    match id {
        DatasetId::Mnist => &[
            DatasetExample { label: "0", image_url: "assets/examples/mnist/0.png" },
            DatasetExample { label: "1", image_url: "assets/examples/mnist/1.png" },
            DatasetExample { label: "2", image_url: "assets/examples/mnist/2.png" },
            DatasetExample { label: "3", image_url: "assets/examples/mnist/3.png" },
        ],
        DatasetId::FashionMnist => &[
            DatasetExample { label: "T-shirt/top", image_url: "https://images.pexels.com/photos/5698851/pexels-photo-5698851.jpeg?auto=compress&cs=tinysrgb&w=300" },
            DatasetExample { label: "Trouser", image_url: "https://images.pexels.com/photos/52518/jeans-pants-blue-shop-52518.jpeg?auto=compress&cs=tinysrgb&w=300" },
            DatasetExample { label: "Pullover", image_url: "https://images.pexels.com/photos/6347548/pexels-photo-6347548.jpeg?auto=compress&cs=tinysrgb&w=300" },
            DatasetExample { label: "Dress", image_url: "https://images.pexels.com/photos/985635/pexels-photo-985635.jpeg?auto=compress&cs=tinysrgb&w=300" },
        ],
        DatasetId::Cifar10 => &[
            DatasetExample { label: "Airplane", image_url: "https://images.pexels.com/photos/46148/aircraft-jet-landing-cloud-46148.jpeg?auto=compress&cs=tinysrgb&w=300" },
            DatasetExample { label: "Automobile", image_url: "https://images.pexels.com/photos/1037995/pexels-photo-1037995.jpeg?auto=compress&cs=tinysrgb&w=300" },
            DatasetExample { label: "Bird", image_url: "https://images.pexels.com/photos/45851/bird-blue-cristata-cyanocitta-45851.jpeg?auto=compress&cs=tinysrgb&w=300" },
            DatasetExample { label: "Cat", image_url: "https://images.pexels.com/photos/45201/kitty-cat-kitten-pet-45201.jpeg?auto=compress&cs=tinysrgb&w=300" },
        ],
    }
}
