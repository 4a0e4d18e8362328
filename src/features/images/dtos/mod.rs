mod image_dto;

pub use image_dto::{ImageRecordDto, UploadImageDto, UploadResponseDto};
