pub mod rabbitmq;
pub mod redis;
pub mod minio;
