// Image upload pipeline: constraints, codec capability, optimizer and storage seam
pub mod cancel;
pub mod codec;
pub mod model;
pub mod service;
pub mod storage;

pub use cancel::CancelFlag;
pub use codec::{ImageCodec, RasterCodec};
pub use model::{
    ContentArea, ImageConstraints, OptimizeOptions, OptimizedImage, OutputFormat, Preset,
    SourceImage, UploadedImage,
};
pub use service::*;
pub use storage::ObjectStorage;
