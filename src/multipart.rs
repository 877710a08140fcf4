use super::{attachment::AttachmentBody, body::ContentBody};
use assert_impl::assert_impl;
use http::{
    header::{HeaderName, IntoHeaderName},
    HeaderMap, HeaderValue,
};
use mime::{Mime, APPLICATION_OCTET_STREAM};
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use rand::random;
use regex::Regex;
use smallstr::SmallString;
use smallvec::SmallVec;
use std::{
    borrow::Cow,
    fmt::Write as _,
    io::{Result as IoResult, Write},
    slice::Iter,
};

/// 文件名
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileName {
    inner: SmallString<[u8; 64]>,
}
wrap_smallstr!(FileName);

/// Multipart 字段名称
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldName {
    inner: SmallString<[u8; 16]>,
}
wrap_smallstr!(FieldName);

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Boundary {
    inner: SmallString<[u8; 32]>,
}
wrap_smallstr!(Boundary);

type HeaderBuffer = SmallVec<[u8; 256]>;

/// Multipart 编码模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MultipartMode {
    /// 兼容浏览器的宽松模式
    ///
    /// 字段名与文件名以 UTF-8 原样写入引号内，只输出 `content-disposition` 与 `content-type`
    #[default]
    BrowserCompatible,

    /// 严格模式
    ///
    /// 非 ASCII 字段名使用 RFC 5987 编码，并为每个组件输出 `content-transfer-encoding`
    Strict,
}

/// Multipart 表单
///
/// 组件按照添加顺序写出
#[derive(Debug)]
pub struct Multipart {
    boundary: Boundary,
    mode: MultipartMode,
    fields: Vec<(FieldName, Part)>,
}

impl Default for Multipart {
    #[inline]
    fn default() -> Self {
        Self::new(Default::default())
    }
}

impl Multipart {
    /// 创建 Multipart 表单
    #[inline]
    pub fn new(mode: MultipartMode) -> Self {
        Self {
            boundary: gen_boundary(),
            mode,
            fields: Default::default(),
        }
    }

    /// 获取分隔符
    #[inline]
    pub fn boundary(&self) -> &str {
        self.boundary.as_str()
    }

    /// 获取编码模式
    #[inline]
    pub fn mode(&self) -> MultipartMode {
        self.mode
    }

    /// 添加 Multipart 表单组件
    #[inline]
    pub fn add_part(&mut self, name: impl Into<FieldName>, part: Part) -> &mut Self {
        self.fields.push((name.into(), part));
        self
    }

    /// 组件个数
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 是否没有组件
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 按照写出顺序遍历组件
    #[inline]
    pub fn parts(&self) -> Iter<'_, (FieldName, Part)> {
        self.fields.iter()
    }

    fn part_headers(&self) -> impl Iterator<Item = (HeaderBuffer, &Part)> + '_ {
        self.fields
            .iter()
            .map(move |(name, part)| (encode_headers(name, &part.meta, self.mode), part))
    }

    fn delimiter_len(&self) -> u64 {
        (b"--".len() + self.boundary.len() + b"\r\n".len()) as u64
    }
}

impl ContentBody for Multipart {
    #[inline]
    fn content_type(&self) -> Cow<'_, str> {
        Cow::Owned(format!("multipart/form-data; boundary={}", self.boundary))
    }

    fn content_length(&self) -> Option<u64> {
        let mut len = 0u64;
        for (headers, part) in self.part_headers() {
            len += self.delimiter_len();
            len += (headers.len() + b"\r\n\r\n".len() + b"\r\n".len()) as u64;
            len += part.body.content_length()?;
        }
        len += (b"--".len() + self.boundary.len() + b"--\r\n".len()) as u64;
        Some(len)
    }

    fn write_to(&self, out: &mut dyn Write) -> IoResult<()> {
        for (headers, part) in self.part_headers() {
            out.write_all(b"--")?;
            out.write_all(self.boundary.as_bytes())?;
            out.write_all(b"\r\n")?;
            out.write_all(&headers)?;
            out.write_all(b"\r\n\r\n")?;
            part.body.write_to(out)?;
            out.write_all(b"\r\n")?;
        }
        out.write_all(b"--")?;
        out.write_all(self.boundary.as_bytes())?;
        out.write_all(b"--\r\n")?;
        Ok(())
    }
}

impl Multipart {
    #[allow(dead_code)]
    fn ignore() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

/// Multipart 表单组件
#[derive(Debug)]
pub struct Part {
    meta: PartMetadata,
    body: PartBody,
}

/// Multipart 表单组件内容
#[derive(Debug)]
#[non_exhaustive]
pub enum PartBody {
    /// UTF-8 文本
    Text(String),

    /// 上传附件
    Attachment(AttachmentBody),
}

impl PartBody {
    fn content_length(&self) -> Option<u64> {
        match self {
            Self::Text(text) => Some(text.len() as u64),
            Self::Attachment(attachment) => attachment.content_length(),
        }
    }

    fn write_to(&self, out: &mut dyn Write) -> IoResult<()> {
        match self {
            Self::Text(text) => out.write_all(text.as_bytes()),
            Self::Attachment(attachment) => attachment.write_to(out),
        }
    }
}

const ENC_8BIT: &str = "8bit";

impl Part {
    /// 创建文本组件
    #[inline]
    pub fn text(value: impl Into<String>, content_type: Mime) -> Self {
        Self {
            meta: PartMetadata {
                content_type: Some(content_type),
                transfer_encoding: Some(ENC_8BIT),
                ..Default::default()
            },
            body: PartBody::Text(value.into()),
        }
    }

    /// 创建附件组件，文件名取自附件的上传文件名
    #[inline]
    pub fn attachment(body: AttachmentBody) -> Self {
        Self {
            meta: PartMetadata {
                file_name: Some(body.file_name().to_owned()),
                content_type: Some(APPLICATION_OCTET_STREAM),
                transfer_encoding: Some(body.transfer_encoding()),
                ..Default::default()
            },
            body: PartBody::Attachment(body),
        }
    }

    /// 设置 Multipart 表单组件的元信息
    #[inline]
    #[must_use]
    pub fn metadata(mut self, metadata: PartMetadata) -> Self {
        self.meta = metadata;
        self
    }

    /// 获取元信息
    #[inline]
    pub fn meta(&self) -> &PartMetadata {
        &self.meta
    }

    /// 获取组件内容
    #[inline]
    pub fn body(&self) -> &PartBody {
        &self.body
    }

    /// 获取文本内容
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            PartBody::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// 获取附件内容
    #[inline]
    pub fn as_attachment(&self) -> Option<&AttachmentBody> {
        match &self.body {
            PartBody::Attachment(attachment) => Some(attachment),
            _ => None,
        }
    }
}

/// Multipart 表单组件元信息
#[derive(Default, Debug, Clone)]
pub struct PartMetadata {
    headers: HeaderMap,
    file_name: Option<FileName>,
    content_type: Option<Mime>,
    transfer_encoding: Option<&'static str>,
}

impl PartMetadata {
    /// 设置表单组件的 MIME 类型
    #[inline]
    #[must_use]
    pub fn mime(mut self, mime: Mime) -> Self {
        self.content_type = Some(mime);
        self
    }

    /// 添加表单组件的 HTTP 头
    #[inline]
    #[must_use]
    pub fn add_header(mut self, name: impl IntoHeaderName, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name, value.into());
        self
    }

    /// 设置表单组件的文件名
    #[inline]
    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<FileName>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// 获取文件名
    #[inline]
    pub fn get_file_name(&self) -> Option<&FileName> {
        self.file_name.as_ref()
    }

    /// 获取 MIME 类型
    #[inline]
    pub fn get_mime(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }
}

impl Extend<(HeaderName, HeaderValue)> for PartMetadata {
    #[inline]
    fn extend<T: IntoIterator<Item = (HeaderName, HeaderValue)>>(&mut self, iter: T) {
        self.headers.extend(iter)
    }
}

fn gen_boundary() -> Boundary {
    let mut b = Boundary {
        inner: SmallString::with_capacity(32),
    };
    write!(b.inner, "{:016x}{:016x}", random::<u64>(), random::<u64>()).ok();
    b
}

fn encode_headers(name: &str, field: &PartMetadata, mode: MultipartMode) -> HeaderBuffer {
    let mut buf = HeaderBuffer::from_slice(b"content-disposition: form-data; ");
    match mode {
        MultipartMode::BrowserCompatible => {
            buf.extend_from_slice(b"name=");
            buf.extend_from_slice(quote(name).as_bytes());
        }
        MultipartMode::Strict => buf.extend_from_slice(&format_parameter("name", name)),
    }
    if let Some(file_name) = field.file_name.as_ref() {
        buf.extend_from_slice(b"; filename=");
        buf.extend_from_slice(quote(file_name).as_bytes());
    }
    if let Some(content_type) = field.content_type.as_ref() {
        buf.extend_from_slice(b"\r\ncontent-type: ");
        buf.extend_from_slice(content_type.as_ref().as_bytes());
    }
    if mode == MultipartMode::Strict {
        if let Some(transfer_encoding) = field.transfer_encoding {
            buf.extend_from_slice(b"\r\ncontent-transfer-encoding: ");
            buf.extend_from_slice(transfer_encoding.as_bytes());
        }
    }
    for (name, value) in field.headers.iter() {
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(name.as_str().as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
    }
    buf
}

fn quote(value: &str) -> String {
    static REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("\\\\|\"|\r|\n").unwrap());
    let mut formatted = String::with_capacity(value.len() + 2);
    formatted.push('"');
    formatted.push_str(&REGEX.replace_all(value, |caps: &regex::Captures| match &caps[0] {
        "\\" => "\\\\",
        "\"" => "\\\"",
        "\r" => "\\\r",
        "\n" => "\\\n",
        _ => unreachable!(),
    }));
    formatted.push('"');
    formatted
}

const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

fn format_parameter(name: &str, value: &str) -> HeaderBuffer {
    let legal_value = {
        let mut buf = HeaderBuffer::new();
        for chunk in utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET) {
            buf.extend_from_slice(chunk.as_bytes());
        }
        buf
    };
    let mut formatted = HeaderBuffer::from_slice(name.as_bytes());
    if value.len() == legal_value.len() {
        formatted.extend_from_slice(b"=\"");
        formatted.extend_from_slice(value.as_bytes());
        formatted.extend_from_slice(b"\"");
    } else {
        formatted.extend_from_slice(b"*=utf-8''");
        formatted.extend_from_slice(&legal_value);
    };
    formatted
}

#[cfg(test)]
mod tests {
    use super::{super::attachment::Attachment, *};
    use mime::{APPLICATION_JSON, TEXT_PLAIN_UTF_8};
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_gen_boundary() {
        env_logger::builder().is_test(true).try_init().ok();

        for _ in 0..5 {
            assert_eq!(gen_boundary().len(), 32);
        }
        assert_ne!(gen_boundary(), gen_boundary());
    }

    #[test]
    fn test_browser_compatible_headers() {
        env_logger::builder().is_test(true).try_init().ok();

        let name = "start%'\"\r\nßend";
        let metadata = PartMetadata::default()
            .file_name(name)
            .mime(APPLICATION_JSON);

        assert_eq!(
            encode_headers(name, &metadata, MultipartMode::BrowserCompatible).as_ref(),
            "content-disposition: form-data; name=\"start%'\\\"\\\r\\\nßend\"; filename=\"start%'\\\"\\\r\\\nßend\"\r\ncontent-type: application/json".as_bytes()
        );
    }

    #[test]
    fn test_strict_headers() {
        env_logger::builder().is_test(true).try_init().ok();

        let name = "start%'\"\r\nßend";
        let part = Part::text("v", TEXT_PLAIN_UTF_8);

        assert_eq!(
            encode_headers(name, part.meta(), MultipartMode::Strict).as_ref(),
            "content-disposition: form-data; name*=utf-8''start%25'%22%0D%0A%C3%9Fend\r\ncontent-type: text/plain; charset=utf-8\r\ncontent-transfer-encoding: 8bit".as_bytes()
        );
        assert_eq!(
            encode_headers("plain", part.meta(), MultipartMode::Strict).as_ref(),
            "content-disposition: form-data; name=\"plain\"\r\ncontent-type: text/plain; charset=utf-8\r\ncontent-transfer-encoding: 8bit".as_bytes()
        );
    }

    #[test]
    fn test_multipart_write_to() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let tempdir = tempdir()?;
        let temp_file_path = tempdir.path().join("fake-file.json");
        File::create(&temp_file_path)?.write_all(b"{\"a\":\"b\"}\n")?;

        let mut multipart = Multipart::default();
        multipart
            .add_part(
                "file1",
                Part::attachment(Attachment::file(&temp_file_path)?.to_content_body()),
            )
            .add_part(
                "bytes1",
                Part::attachment(Attachment::bytes(b"part1".as_slice(), "upload").to_content_body()),
            )
            .add_part("text1", Part::text("value1", TEXT_PLAIN_UTF_8))
            .add_part(
                "text2",
                Part::text("value2", TEXT_PLAIN_UTF_8).metadata(PartMetadata::default()),
            );
        multipart.boundary = "boundary".into();

        const EXPECTED: &str = "--boundary\r\n\
        content-disposition: form-data; name=\"file1\"; filename=\"fake-file.json\"\r\n\
        content-type: application/octet-stream\r\n\r\n\
        {\"a\":\"b\"}\n\r\n\
        --boundary\r\n\
        content-disposition: form-data; name=\"bytes1\"; filename=\"upload\"\r\n\
        content-type: application/octet-stream\r\n\r\n\
        part1\r\n\
        --boundary\r\n\
        content-disposition: form-data; name=\"text1\"\r\n\
        content-type: text/plain; charset=utf-8\r\n\r\n\
        value1\r\n\
        --boundary\r\n\
        content-disposition: form-data; name=\"text2\"\r\n\r\n\
        value2\r\n\
        --boundary--\
        \r\n";

        let mut actual = Vec::new();
        multipart.write_to(&mut actual)?;
        assert_eq!(String::from_utf8(actual)?, EXPECTED);
        assert_eq!(multipart.content_length(), Some(EXPECTED.len() as u64));
        assert_eq!(multipart.content_type(), "multipart/form-data; boundary=boundary");
        assert_eq!(multipart.len(), 4);

        tempdir.close()?;
        Ok(())
    }

    #[test]
    fn test_content_length_unknown_for_missing_file() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let mut multipart = Multipart::new(MultipartMode::Strict);
        multipart.add_part(
            "file",
            Part::attachment(Attachment::file("/definitely/not/here.bin")?.to_content_body()),
        );
        assert_eq!(multipart.content_length(), None);
        Ok(())
    }
}
