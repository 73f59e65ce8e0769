//! 数据模型模块
//! 存储行、请求 DTO 与响应 DTO

pub mod comment;
pub mod group;
pub mod post;
pub mod user;
