use super::{
    body::ContentBody,
    error::{Error, Result},
    multipart::FileName,
};
use mime::APPLICATION_OCTET_STREAM;
use std::{
    borrow::Cow,
    fmt::{self, Debug},
    fs::{metadata, File},
    io::{copy, Result as IoResult, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

/// 上传数据来源
#[derive(Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// 文件系统中的文件
    File(PathBuf),

    /// 内存数据
    Buffer(Arc<[u8]>),
}

impl Debug for AttachmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Buffer(buffer) => f.debug_tuple("Buffer").field(&buffer.len()).finish(),
        }
    }
}

impl From<PathBuf> for AttachmentSource {
    #[inline]
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for AttachmentSource {
    #[inline]
    fn from(path: &Path) -> Self {
        Self::File(path.to_owned())
    }
}

impl From<Vec<u8>> for AttachmentSource {
    #[inline]
    fn from(buffer: Vec<u8>) -> Self {
        Self::Buffer(buffer.into())
    }
}

impl From<&[u8]> for AttachmentSource {
    #[inline]
    fn from(buffer: &[u8]) -> Self {
        Self::Buffer(buffer.into())
    }
}

impl From<Arc<[u8]>> for AttachmentSource {
    #[inline]
    fn from(buffer: Arc<[u8]>) -> Self {
        Self::Buffer(buffer)
    }
}

/// 上传附件
///
/// 由数据来源与上传时使用的文件名组成，上传文件名可以与原文件名不同
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    source: AttachmentSource,
    file_name: FileName,
}

impl Attachment {
    /// 使用文件创建附件，上传文件名为文件自身的名称
    pub fn file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(Error::argument("file path cannot be empty"));
        }
        let file_name = path
            .file_name()
            .map(|name| FileName::from(name.to_string_lossy()))
            .ok_or_else(|| Error::argument(format!("file path {} has no file name", path.display())))?;
        Ok(Self {
            source: AttachmentSource::File(path),
            file_name,
        })
    }

    /// 使用文件创建附件，并指定上传文件名
    pub fn file_with_name(path: impl Into<PathBuf>, file_name: impl Into<FileName>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(Error::argument("file path cannot be empty"));
        }
        Ok(Self {
            source: AttachmentSource::File(path),
            file_name: file_name.into(),
        })
    }

    /// 使用内存数据创建附件
    #[inline]
    pub fn bytes(buffer: impl Into<Arc<[u8]>>, file_name: impl Into<FileName>) -> Self {
        Self {
            source: AttachmentSource::Buffer(buffer.into()),
            file_name: file_name.into(),
        }
    }

    /// 获取数据来源
    #[inline]
    pub fn source(&self) -> &AttachmentSource {
        &self.source
    }

    /// 获取上传文件名
    #[inline]
    pub fn file_name(&self) -> &FileName {
        &self.file_name
    }

    /// 生成请求体
    #[inline]
    pub fn to_content_body(&self) -> AttachmentBody {
        AttachmentBody {
            source: self.source.to_owned(),
            file_name: self.file_name.to_owned(),
        }
    }
}

/// 附件请求体
///
/// 无论数据来自文件还是内存，写出的字节完全一致
#[derive(Debug, Clone)]
pub struct AttachmentBody {
    source: AttachmentSource,
    file_name: FileName,
}

const ENC_BINARY: &str = "binary";

impl AttachmentBody {
    /// 上传文件名
    #[inline]
    pub fn file_name(&self) -> &FileName {
        &self.file_name
    }

    /// 传输编码，总是 `binary`
    #[inline]
    pub fn transfer_encoding(&self) -> &'static str {
        ENC_BINARY
    }

    /// 字符集，二进制数据没有字符集
    #[inline]
    pub fn charset(&self) -> Option<&str> {
        None
    }
}

impl ContentBody for AttachmentBody {
    #[inline]
    fn content_type(&self) -> Cow<'_, str> {
        Cow::Borrowed(APPLICATION_OCTET_STREAM.as_ref())
    }

    fn content_length(&self) -> Option<u64> {
        match &self.source {
            AttachmentSource::File(path) => metadata(path).ok().map(|meta| meta.len()),
            AttachmentSource::Buffer(buffer) => Some(buffer.len() as u64),
        }
    }

    fn write_to(&self, out: &mut dyn Write) -> IoResult<()> {
        match &self.source {
            AttachmentSource::File(path) => {
                copy(&mut File::open(path)?, out)?;
                Ok(())
            }
            AttachmentSource::Buffer(buffer) => out.write_all(buffer),
        }
    }
}
