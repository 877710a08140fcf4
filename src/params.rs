use log::warn;
use percent_encoding::percent_decode_str;
use smallstr::SmallString;
use std::{borrow::Cow, slice::Iter, vec::IntoIter};

/// 请求参数名称
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamName {
    inner: SmallString<[u8; 32]>,
}
wrap_smallstr!(ParamName);

/// 请求参数值
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamValue {
    inner: SmallString<[u8; 64]>,
}
wrap_smallstr!(ParamValue);

/// 请求参数
///
/// 名称不要求唯一
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    name: ParamName,
    value: ParamValue,
}

impl Param {
    /// 创建请求参数
    #[inline]
    pub fn new(name: impl Into<ParamName>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// 获取参数名称
    #[inline]
    pub fn name(&self) -> &ParamName {
        &self.name
    }

    /// 获取参数值
    #[inline]
    pub fn value(&self) -> &ParamValue {
        &self.value
    }
}

impl<N: Into<ParamName>, V: Into<ParamValue>> From<(N, V)> for Param {
    #[inline]
    fn from((name, value): (N, V)) -> Self {
        Self::new(name, value)
    }
}

/// 有序请求参数列表
///
/// 保留插入顺序，允许重名参数
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(Vec<Param>);

impl Params {
    /// 创建空的参数列表
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// 追加参数
    #[inline]
    pub fn push(&mut self, param: impl Into<Param>) {
        self.0.push(param.into());
    }

    /// 参数个数
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否没有参数
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按插入顺序遍历参数
    #[inline]
    pub fn iter(&self) -> Iter<'_, Param> {
        self.0.iter()
    }

    /// 获取第一个名为 `name` 的参数值
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.iter().find(|param| param.name() == name).map(Param::value)
    }

    /// 编码为 `application/x-www-form-urlencoded` 字符串
    pub fn to_form_urlencoded(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter().map(|param| (param.name.as_str(), param.value.as_str())))
            .finish()
    }

    /// 解析 `key=value&key=value` 格式的查询字符串
    ///
    /// 无法解码的参数对会被忽略
    pub fn parse_query(query: &str) -> Self {
        let mut params = Self::new();
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                warn!("query pair without `=` dropped: {pair:?}");
                continue;
            };
            match (decode_component(key), decode_component(value)) {
                (Some(key), Some(value)) => params.push((key, value)),
                _ => warn!("malformed query pair dropped: {pair:?}"),
            }
        }
        params
    }
}

impl<P: Into<Param>> FromIterator<P> for Params {
    #[inline]
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<P: Into<Param>> Extend<P> for Params {
    #[inline]
    fn extend<T: IntoIterator<Item = P>>(&mut self, iter: T) {
        self.0.extend(iter.into_iter().map(Into::into))
    }
}

impl IntoIterator for Params {
    type Item = Param;
    type IntoIter = IntoIter<Param>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = Iter<'a, Param>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// `+` 视为空格，`%` 之后必须紧跟两位十六进制数，解码结果必须是合法的 UTF-8
fn decode_component(component: &str) -> Option<Cow<'_, str>> {
    let bytes = component.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            match bytes.get(i + 1..i + 3) {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => return None,
            }
        } else {
            i += 1;
        }
    }
    let component = if component.contains('+') {
        Cow::Owned(component.replace('+', " "))
    } else {
        Cow::Borrowed(component)
    };
    match component {
        Cow::Borrowed(s) => percent_decode_str(s).decode_utf8().ok(),
        Cow::Owned(s) => percent_decode_str(&s)
            .decode_utf8()
            .ok()
            .map(|decoded| Cow::Owned(decoded.into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_urlencoded_keeps_order_and_duplicates() {
        env_logger::builder().is_test(true).try_init().ok();

        let params: Params = [
            ("track[title]", "hello world"),
            ("a", "1"),
            ("a", "2"),
            ("emoji", "ß&="),
        ]
        .into_iter()
        .collect();
        let encoded = params.to_form_urlencoded();
        assert_eq!(encoded, "track%5Btitle%5D=hello+world&a=1&a=2&emoji=%C3%9F%26%3D");

        let decoded: Vec<(String, String)> = form_urlencoded::parse(encoded.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let original: Vec<(String, String)> = params
            .iter()
            .map(|p| (p.name().to_string(), p.value().to_string()))
            .collect();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_parse_query() {
        env_logger::builder().is_test(true).try_init().ok();

        let params = Params::parse_query("a=1&b=2&c=hello+world&d=%E4%B8%83&e=&noval&&f=x=y");
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|p| (p.name().as_str(), p.value().as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a", "1"),
                ("b", "2"),
                ("c", "hello world"),
                ("d", "七"),
                ("e", ""),
                ("f", "x=y"),
            ]
        );
    }

    #[test]
    fn test_parse_query_drops_malformed_pairs() {
        env_logger::builder().is_test(true).try_init().ok();

        let params = Params::parse_query("good=1&bad=%zz&worse=%E4&tail=%4&ok=2");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("good").map(ParamValue::as_str), Some("1"));
        assert_eq!(params.get("ok").map(ParamValue::as_str), Some("2"));
        assert!(params.get("bad").is_none());
    }

    #[test]
    fn test_empty_params() {
        env_logger::builder().is_test(true).try_init().ok();

        assert_eq!(Params::new().to_form_urlencoded(), "");
        assert!(Params::parse_query("").is_empty());
    }
}
