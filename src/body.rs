use super::{callback::TransferListener, error::TransferAborted, multipart::Multipart};
use log::trace;
use std::{
    borrow::Cow,
    fmt::{self, Debug},
    io::{Result as IoResult, Write},
    sync::Arc,
};

/// 可流式写出的请求体
///
/// 文件、内存数据、Multipart 表单都实现该接口，写出结果与数据来源无关
pub trait ContentBody: Debug + Send + Sync {
    /// 请求体的 MIME 类型
    fn content_type(&self) -> Cow<'_, str>;

    /// 请求体长度，无法预知时返回 [`None`]
    fn content_length(&self) -> Option<u64>;

    /// 将请求体完整写入 `out`
    fn write_to(&self, out: &mut dyn Write) -> IoResult<()>;
}

impl<B: ContentBody + ?Sized> ContentBody for Box<B> {
    #[inline]
    fn content_type(&self) -> Cow<'_, str> {
        (**self).content_type()
    }

    #[inline]
    fn content_length(&self) -> Option<u64> {
        (**self).content_length()
    }

    #[inline]
    fn write_to(&self, out: &mut dyn Write) -> IoResult<()> {
        (**self).write_to(out)
    }
}

/// 带上传进度统计的请求体
///
/// 写出时在请求体与实际输出之间插入计数器，每写出一段数据就将累计字节数通知给 [`TransferListener`]
pub struct CountingBody<B> {
    inner: B,
    listener: Arc<dyn TransferListener>,
}

impl<B: ContentBody> CountingBody<B> {
    /// 创建带上传进度统计的请求体
    #[inline]
    pub fn new(inner: B, listener: Arc<dyn TransferListener>) -> Self {
        Self { inner, listener }
    }

    /// 获取被包装的请求体
    #[inline]
    pub fn get_ref(&self) -> &B {
        &self.inner
    }

    /// 转换为被包装的请求体
    #[inline]
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: ContentBody> ContentBody for CountingBody<B> {
    #[inline]
    fn content_type(&self) -> Cow<'_, str> {
        self.inner.content_type()
    }

    #[inline]
    fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }

    fn write_to(&self, out: &mut dyn Write) -> IoResult<()> {
        let mut counting = CountingWriter {
            inner: out,
            listener: self.listener.as_ref(),
            transferred: 0,
        };
        self.inner.write_to(&mut counting)?;
        counting.flush()
    }
}

impl<B: Debug> Debug for CountingBody<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingBody")
            .field("inner", &self.inner)
            .field("listener", &"Installed")
            .finish()
    }
}

struct CountingWriter<'a> {
    inner: &'a mut dyn Write,
    listener: &'a dyn TransferListener,
    transferred: u64,
}

impl Write for CountingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        let n = self.inner.write(buf)?;
        if n > 0 {
            self.transferred += n as u64;
            trace!("transferred {} bytes", self.transferred);
            self.listener
                .transferred(self.transferred)
                .map_err(|err| TransferAborted::new(self.transferred, err).into_io_error())?;
        }
        Ok(n)
    }

    #[inline]
    fn flush(&mut self) -> IoResult<()> {
        self.inner.flush()
    }
}

/// 构建完成的 HTTP 请求体
#[derive(Debug, Default)]
#[non_exhaustive]
pub enum RequestBody {
    /// 没有请求体
    #[default]
    Empty,

    /// 表单或原始请求体
    Bytes(Vec<u8>),

    /// Multipart 表单
    Multipart(Multipart),

    /// 带上传进度统计的 Multipart 表单
    Counting(CountingBody<Multipart>),
}

impl RequestBody {
    /// 是否没有请求体
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// 获取 Multipart 表单
    #[inline]
    pub fn as_multipart(&self) -> Option<&Multipart> {
        match self {
            Self::Multipart(multipart) => Some(multipart),
            Self::Counting(counting) => Some(counting.get_ref()),
            _ => None,
        }
    }

    /// 请求体长度
    pub fn content_length(&self) -> Option<u64> {
        match self {
            Self::Empty => Some(0),
            Self::Bytes(bytes) => Some(bytes.len() as u64),
            Self::Multipart(multipart) => multipart.content_length(),
            Self::Counting(counting) => counting.content_length(),
        }
    }

    /// 将请求体完整写入 `out`
    ///
    /// 对于带上传进度统计的请求体，回调返回的错误将以 [`TransferAborted`] 的形式返回
    pub fn write_to(&self, out: &mut dyn Write) -> IoResult<()> {
        match self {
            Self::Empty => Ok(()),
            Self::Bytes(bytes) => out.write_all(bytes),
            Self::Multipart(multipart) => multipart.write_to(out),
            Self::Counting(counting) => counting.write_to(out),
        }
    }

    /// 将请求体写入内存
    pub fn to_bytes(&self) -> IoResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.content_length().unwrap_or_default() as usize);
        self.write_to(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::{
        io::{Error as IoError, ErrorKind as IoErrorKind},
        sync::Mutex,
    };

    #[derive(Debug)]
    struct Chunked(Vec<&'static [u8]>);

    impl ContentBody for Chunked {
        fn content_type(&self) -> Cow<'_, str> {
            Cow::Borrowed("application/octet-stream")
        }

        fn content_length(&self) -> Option<u64> {
            Some(self.0.iter().map(|chunk| chunk.len() as u64).sum())
        }

        fn write_to(&self, out: &mut dyn Write) -> IoResult<()> {
            for chunk in &self.0 {
                out.write_all(chunk)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_counting_body_reports_cumulative_bytes() -> IoResult<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let reports = Arc::new(Mutex::new(Vec::new()));
        let body = CountingBody::new(Chunked(vec![b"hello".as_slice(), b"", b", ", b"world"]), {
            let reports = reports.to_owned();
            Arc::new(move |n: u64| -> anyhow::Result<()> {
                reports.lock().unwrap().push(n);
                Ok(())
            })
        });
        assert_eq!(body.content_length(), Some(12));
        assert_eq!(body.content_type(), "application/octet-stream");

        let mut out = Vec::new();
        body.write_to(&mut out)?;
        assert_eq!(out, b"hello, world");
        assert_eq!(*reports.lock().unwrap(), vec![5, 7, 12]);
        Ok(())
    }

    #[test]
    fn test_counting_body_aborts_transfer() {
        env_logger::builder().is_test(true).try_init().ok();

        let body = CountingBody::new(
            Chunked(vec![b"hello".as_slice(), b", ", b"world"]),
            Arc::new(|n: u64| -> anyhow::Result<()> {
                if n > 5 {
                    Err(anyhow!("cancelled"))
                } else {
                    Ok(())
                }
            }),
        );
        let mut out = Vec::new();
        let err: IoError = body.write_to(&mut out).unwrap_err();
        assert_eq!(err.kind(), IoErrorKind::Other);
        assert!(TransferAborted::is_transfer_aborted(&err));
        let aborted = err.into_inner().unwrap().downcast::<TransferAborted>().unwrap();
        assert_eq!(aborted.transferred(), 7);
        assert_eq!(out, b"hello, ");
    }

    #[test]
    fn test_request_body_bytes() -> IoResult<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let body = RequestBody::Bytes(b"a=1".to_vec());
        assert_eq!(body.content_length(), Some(3));
        assert_eq!(body.to_bytes()?, b"a=1");
        assert!(RequestBody::default().is_empty());
        assert_eq!(RequestBody::Empty.to_bytes()?, b"");
        Ok(())
    }
}
