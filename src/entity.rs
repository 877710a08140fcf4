use super::error::{Error, Result};
use mime::{Mime, APPLICATION_OCTET_STREAM, TEXT_PLAIN_UTF_8};
use std::fmt::{self, Debug};

/// 原始请求体
///
/// 仅在请求没有附件且没有参数时使用
#[derive(Clone, PartialEq, Eq)]
pub struct Entity {
    body: Vec<u8>,
    content_type: Mime,
}

impl Entity {
    /// 使用二进制数据创建请求体，未指定类型时为 `application/octet-stream`
    #[inline]
    pub fn new(body: impl Into<Vec<u8>>, content_type: Option<Mime>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.unwrap_or(APPLICATION_OCTET_STREAM),
        }
    }

    /// 使用文本创建请求体
    ///
    /// 按照 `content_type` 中的 `charset` 参数编码文本，未指定时使用 UTF-8。
    /// 支持 `utf-8`，`us-ascii` 与 `iso-8859-1`，文本无法用该字符集表示时返回 [`Error::Encoding`]
    pub fn text(content: &str, content_type: Option<Mime>) -> Result<Self> {
        let content_type = content_type.unwrap_or(TEXT_PLAIN_UTF_8);
        let body = match content_type.get_param(mime::CHARSET) {
            None => content.as_bytes().to_owned(),
            Some(charset) => encode(content, charset.as_str())?,
        };
        Ok(Self { body, content_type })
    }

    /// 获取请求体内容
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 获取 MIME 类型
    #[inline]
    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }
}

impl Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("len", &self.body.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

fn encode(content: &str, charset: &str) -> Result<Vec<u8>> {
    let max = match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => return Ok(content.as_bytes().to_owned()),
        "us-ascii" | "ascii" => 0x7f,
        "iso-8859-1" | "latin1" | "iso_8859-1" => 0xff,
        _ => return Err(Error::encoding(charset)),
    };
    content
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok().filter(|&b| u32::from(b) <= max))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| Error::encoding(charset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mime::APPLICATION_JSON;

    #[test]
    fn test_text_entity_default_utf8() -> Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let entity = Entity::text("héllo", None)?;
        assert_eq!(entity.body(), "héllo".as_bytes());
        assert_eq!(entity.content_type(), &TEXT_PLAIN_UTF_8);

        let entity = Entity::text("{\"a\":1}", Some(APPLICATION_JSON))?;
        assert_eq!(entity.body(), b"{\"a\":1}");
        assert_eq!(entity.content_type().as_ref(), "application/json");
        Ok(())
    }

    #[test]
    fn test_text_entity_charsets() -> Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let latin1: Mime = "text/plain; charset=ISO-8859-1".parse().unwrap();
        assert_eq!(Entity::text("héllo", Some(latin1.to_owned()))?.body(), b"h\xe9llo");
        assert!(matches!(
            Entity::text("中文", Some(latin1)),
            Err(Error::Encoding { charset }) if charset.eq_ignore_ascii_case("iso-8859-1")
        ));

        let ascii: Mime = "text/plain; charset=us-ascii".parse().unwrap();
        assert!(matches!(Entity::text("héllo", Some(ascii)), Err(Error::Encoding { .. })));

        let unknown: Mime = "text/plain; charset=x-klingon".parse().unwrap();
        assert!(matches!(Entity::text("hello", Some(unknown)), Err(Error::Encoding { .. })));
        Ok(())
    }

    #[test]
    fn test_binary_entity() {
        env_logger::builder().is_test(true).try_init().ok();

        let entity = Entity::new(vec![0u8, 1, 2], None);
        assert_eq!(entity.body(), &[0u8, 1, 2]);
        assert_eq!(entity.content_type(), &APPLICATION_OCTET_STREAM);
    }
}
