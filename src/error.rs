use std::{io::Error as IoError, result};
use thiserror::Error;

/// 请求构建错误
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// 调用方传入了非法参数
    #[error("invalid argument: {0}")]
    Argument(String),

    /// 资源路径模版与参数不匹配
    #[error("invalid resource template: {0}")]
    Format(#[from] TemplateError),

    /// 文本无法按照指定字符集编码
    #[error("cannot encode content as {charset}")]
    Encoding {
        /// 字符集名称
        charset: String,
    },

    /// 构建 HTTP 请求失败
    #[error("failed to build request: {0}")]
    Build(#[from] http::Error),
}

impl Error {
    #[inline]
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    #[inline]
    pub(crate) fn encoding(charset: impl Into<String>) -> Self {
        Self::Encoding {
            charset: charset.into(),
        }
    }
}

/// 请求构建结果
pub type Result<T> = result::Result<T, Error>;

/// 资源路径模版错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateError {
    /// 存在未闭合的 `{`
    #[error("unclosed placeholder starting at byte {0}")]
    UnclosedPlaceholder(usize),

    /// 存在未配对的 `}`
    #[error("unmatched `}}` at byte {0}")]
    UnmatchedBrace(usize),

    /// 占位符内容无法识别
    #[error("invalid placeholder `{{{0}}}`")]
    InvalidPlaceholder(String),

    /// 占位符引用的参数不存在
    #[error("placeholder refers to argument {index} but only {count} given")]
    MissingArgument {
        /// 引用的参数序号
        index: usize,
        /// 实际参数个数
        count: usize,
    },

    /// 参数没有被任何占位符引用
    #[error("argument {index} of {count} is not referenced by any placeholder")]
    UnusedArgument {
        /// 未被引用的参数序号
        index: usize,
        /// 实际参数个数
        count: usize,
    },
}

/// 上传进度回调要求终止传输
///
/// 作为 [`std::io::Error`] 的内部错误返回给传输层，可以通过 [`TransferAborted::is_transfer_aborted`] 识别
#[derive(Error, Debug)]
#[error("transfer aborted by listener after {transferred} bytes: {source}")]
pub struct TransferAborted {
    transferred: u64,
    #[source]
    source: anyhow::Error,
}

impl TransferAborted {
    #[inline]
    pub(crate) fn new(transferred: u64, source: anyhow::Error) -> Self {
        Self { transferred, source }
    }

    /// 终止时已经传输的字节数
    #[inline]
    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    /// 判断 I/O 错误是否由上传进度回调终止传输引起
    #[inline]
    pub fn is_transfer_aborted(err: &IoError) -> bool {
        err.get_ref().map_or(false, |inner| inner.is::<Self>())
    }

    pub(crate) fn into_io_error(self) -> IoError {
        IoError::new(std::io::ErrorKind::Other, self)
    }
}
