#![deny(
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    trivial_casts,
    unused_extern_crates,
    unused_import_braces
)]

//! # api-request
//!
//! ## 请求构建器
//!
//! 收集资源路径，请求参数，上传附件，原始请求体，鉴权凭证，条件请求与上传进度回调，
//! 根据 HTTP 方法生成可以交给任意传输层发送的 [`http::Request`]。
//!
//! 对于 `POST`，`PUT` 与 `PATCH` 方法，请求体按照以下优先级选择：
//!
//! 1. 存在附件时使用 `multipart/form-data`，附件在前，参数作为文本组件在后
//! 2. 存在参数时使用 `application/x-www-form-urlencoded`
//! 3. 否则使用原始请求体
//!
//! 其他方法的参数将作为查询字符串追加到资源路径之后。

#[macro_use]
mod macros;

mod attachment;
mod body;
mod callback;
mod config;
mod entity;
mod error;
mod multipart;
mod params;
mod request;
mod template;
mod token;

pub use attachment::{Attachment, AttachmentBody, AttachmentSource};
pub use body::{ContentBody, CountingBody, RequestBody};
pub use callback::TransferListener;
pub use config::{Config, ConfigBuilder};
pub use entity::Entity;
pub use error::{Error, Result, TemplateError, TransferAborted};
pub use multipart::{FieldName, FileName, Multipart, MultipartMode, Part, PartBody, PartMetadata};
pub use params::{Param, ParamName, ParamValue, Params};
pub use request::{encloses_body, BodyKind, BuiltRequest, Request};
pub use token::{Authorizer, OAuthAuthorizer, Token};

pub use http::{self, Method};
pub use mime::{self, Mime};
