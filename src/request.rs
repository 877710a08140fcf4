use super::{
    attachment::Attachment,
    body::{ContentBody, CountingBody, RequestBody},
    callback::TransferListener,
    config::Config,
    entity::Entity,
    error::{Error, Result},
    multipart::{FieldName, FileName, Multipart, Part},
    params::{Param, ParamName, Params},
    template,
    token::{Authorizer, OAuthAuthorizer, Token},
};
use http::{
    header::{CONTENT_TYPE, IF_NONE_MATCH},
    Method, Uri,
};
use indexmap::IndexMap;
use log::debug;
use mime::{Mime, APPLICATION_WWW_FORM_URLENCODED};
use std::{
    fmt::{self, Debug, Display},
    path::PathBuf,
    slice::Iter,
    sync::Arc,
};
use url::Url;

/// 构建完成的 HTTP 请求
pub type BuiltRequest = http::Request<RequestBody>;

/// HTTP 方法是否携带请求体
///
/// `POST`，`PUT` 与 `PATCH` 携带请求体，其他方法的参数将作为查询字符串追加到 URL 上
#[inline]
pub fn encloses_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// 请求体编码方式
///
/// 优先级为 Multipart > 表单 > 原始请求体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind<'a> {
    /// 存在附件，参数作为文本组件写入 Multipart 表单
    Multipart,

    /// 没有附件但存在参数，使用 `application/x-www-form-urlencoded` 编码
    Form,

    /// 既没有附件也没有参数，使用原始请求体
    Entity(&'a Entity),

    /// 没有请求体
    Empty,
}

/// HTTP 请求构建器
///
/// 收集资源路径，参数，附件，原始请求体，鉴权凭证，条件请求与上传进度回调，
/// 最后通过 [`Request::build`] 生成指定 HTTP 方法的请求。
///
/// ```
/// use api_request::Request;
/// use http::Method;
///
/// # fn main() -> anyhow::Result<()> {
/// let request = Request::new("/tracks?order=hotness")
///     .add("track[title]", "Hello")
///     .add("track[user]", 1234)
///     .build(Method::GET)?;
/// assert_eq!(
///     request.uri(),
///     "/tracks?order=hotness&track%5Btitle%5D=Hello&track%5Buser%5D=1234"
/// );
/// # Ok(())
/// # }
/// ```
///
/// 复制构建器会复制参数与附件列表，鉴权凭证与上传进度回调则是共享的
#[derive(Clone, Default)]
pub struct Request {
    resource: String,
    params: Params,
    files: IndexMap<FieldName, Attachment>,
    entity: Option<Entity>,
    token: Option<Arc<Token>>,
    authorizer: Option<Arc<dyn Authorizer>>,
    listener: Option<Arc<dyn TransferListener>>,
    if_none_match: Option<String>,
    config: Config,
}

impl Request {
    /// 使用资源路径创建请求构建器
    ///
    /// 资源路径中 `?` 之后的部分将被解析为参数，无法解码的参数对会被忽略
    pub fn new(resource: impl AsRef<str>) -> Self {
        let resource = resource.as_ref();
        let (resource, params) = match resource.split_once('?') {
            Some((path, query)) => (path, Params::parse_query(query)),
            None => (resource, Params::new()),
        };
        Self {
            resource: resource.to_owned(),
            params,
            ..Default::default()
        }
    }

    /// 使用资源路径模版创建请求构建器
    ///
    /// 模版支持 `{}` 与 `{0}` 占位符，`%s`，`%d` 等 printf 风格的写法不是占位符。
    /// 没有参数时模版原样作为资源路径，有参数时每个参数都必须被引用，否则返回 [`Error::Format`]
    ///
    /// ```
    /// use api_request::Request;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let request = Request::to("/users/{}/tracks?limit={}", &[&"bob", &10])?;
    /// assert_eq!(request.resource(), "/users/bob/tracks");
    /// assert_eq!(request.query_string(), "limit=10");
    /// # Ok(())
    /// # }
    /// ```
    pub fn to(template: &str, args: &[&dyn Display]) -> Result<Self> {
        if args.is_empty() {
            Ok(Self::new(template))
        } else {
            Ok(Self::new(template::expand(template, args)?))
        }
    }

    /// 使用 URI 创建请求构建器，协议与主机名会被忽略
    pub fn from_uri(uri: &Uri) -> Self {
        let path = match uri.path() {
            "" => "/",
            path => path,
        };
        match uri.query() {
            Some(query) => Self::new(format!("{path}?{query}")),
            None => Self::new(path),
        }
    }

    /// 使用 URL 创建请求构建器，协议，主机名与片段会被忽略
    pub fn from_url(url: &Url) -> Self {
        match url.query() {
            Some(query) => Self::new(format!("{}?{}", url.path(), query)),
            None => Self::new(url.path()),
        }
    }

    /// 追加参数
    #[inline]
    pub fn add(&mut self, name: impl Into<ParamName>, value: impl Display) -> &mut Self {
        self.params.push(Param::new(name, value.to_string()));
        self
    }

    /// 以名称，值交替的方式追加多个参数
    ///
    /// 参数个数为奇数时返回 [`Error::Argument`]，此时不会追加任何参数
    pub fn with_many<T: Display>(&mut self, args: impl IntoIterator<Item = T>) -> Result<&mut Self> {
        let args: Vec<String> = args.into_iter().map(|arg| arg.to_string()).collect();
        if args.len() % 2 != 0 {
            return Err(Error::argument("need even number of arguments"));
        }
        let mut args = args.into_iter();
        while let (Some(name), Some(value)) = (args.next(), args.next()) {
            self.params.push((name, value));
        }
        Ok(self)
    }

    /// 追加多个参数
    #[inline]
    pub fn with_params<P: Into<Param>>(&mut self, params: impl IntoIterator<Item = P>) -> &mut Self {
        self.params.extend(params);
        self
    }

    /// 设置鉴权凭证
    #[inline]
    pub fn using_token(&mut self, token: impl Into<Arc<Token>>) -> &mut Self {
        self.token = Some(token.into());
        self
    }

    /// 设置鉴权头生成方式，默认为 [`OAuthAuthorizer`]
    #[inline]
    pub fn authorizer(&mut self, authorizer: impl Authorizer + 'static) -> &mut Self {
        self.authorizer = Some(Arc::new(authorizer));
        self
    }

    /// 添加文件附件，上传文件名为文件自身的名称
    ///
    /// 同名附件将被替换
    #[inline]
    pub fn with_file(&mut self, name: impl Into<FieldName>, path: impl Into<PathBuf>) -> Result<&mut Self> {
        let attachment = Attachment::file(path)?;
        Ok(self.with_attachment(name, attachment))
    }

    /// 添加文件附件，并指定上传文件名
    #[inline]
    pub fn with_file_named(
        &mut self,
        name: impl Into<FieldName>,
        path: impl Into<PathBuf>,
        file_name: impl Into<FileName>,
    ) -> Result<&mut Self> {
        let attachment = Attachment::file_with_name(path, file_name)?;
        Ok(self.with_attachment(name, attachment))
    }

    /// 添加内存数据附件，上传文件名为配置中的默认文件名
    #[inline]
    pub fn with_bytes(&mut self, name: impl Into<FieldName>, data: impl Into<Arc<[u8]>>) -> &mut Self {
        let file_name = self.config.default_upload_file_name().to_owned();
        self.with_attachment(name, Attachment::bytes(data, file_name))
    }

    /// 添加内存数据附件，并指定上传文件名
    #[inline]
    pub fn with_bytes_named(
        &mut self,
        name: impl Into<FieldName>,
        data: impl Into<Arc<[u8]>>,
        file_name: impl Into<FileName>,
    ) -> &mut Self {
        self.with_attachment(name, Attachment::bytes(data, file_name))
    }

    /// 添加附件
    ///
    /// 传入 [`None`] 时不做任何修改，同名附件将被替换
    #[inline]
    pub fn with_attachment(&mut self, name: impl Into<FieldName>, attachment: impl Into<Option<Attachment>>) -> &mut Self {
        if let Some(attachment) = attachment.into() {
            self.files.insert(name.into(), attachment);
        }
        self
    }

    /// 设置原始请求体
    #[inline]
    pub fn with_entity(&mut self, entity: Entity) -> &mut Self {
        self.entity = Some(entity);
        self
    }

    /// 设置文本请求体
    ///
    /// 文本无法按照 `content_type` 中的字符集编码时返回 [`Error::Encoding`]
    #[inline]
    pub fn with_content(&mut self, content: &str, content_type: Option<Mime>) -> Result<&mut Self> {
        let entity = Entity::text(content, content_type)?;
        Ok(self.with_entity(entity))
    }

    /// 设置上传进度回调
    #[inline]
    pub fn set_progress_listener(&mut self, listener: impl TransferListener + 'static) -> &mut Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// 设置条件请求的 ETag (`If-None-Match`)
    #[inline]
    pub fn if_none_match(&mut self, etag: impl Into<String>) -> &mut Self {
        self.if_none_match = Some(etag.into());
        self
    }

    /// 设置请求构建配置
    #[inline]
    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    /// 获取资源路径
    #[inline]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// 获取参数列表
    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// 参数个数
    #[inline]
    pub fn size(&self) -> usize {
        self.params.len()
    }

    /// 按插入顺序遍历参数
    #[inline]
    pub fn iter(&self) -> Iter<'_, Param> {
        self.params.iter()
    }

    /// 获取附件列表，按照注册顺序排列
    #[inline]
    pub fn attachments(&self) -> &IndexMap<FieldName, Attachment> {
        &self.files
    }

    /// 获取原始请求体
    #[inline]
    pub fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    /// 获取鉴权凭证
    #[inline]
    pub fn token(&self) -> Option<&Arc<Token>> {
        self.token.as_ref()
    }

    /// 获取上传进度回调
    #[inline]
    pub fn listener(&self) -> Option<&Arc<dyn TransferListener>> {
        self.listener.as_ref()
    }

    /// 获取条件请求的 ETag
    #[inline]
    pub fn if_none_match_value(&self) -> Option<&str> {
        self.if_none_match.as_deref()
    }

    /// 获取请求构建配置
    #[inline]
    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// 将参数编码为 `application/x-www-form-urlencoded` 字符串
    #[inline]
    pub fn query_string(&self) -> String {
        self.params.to_form_urlencoded()
    }

    /// 生成追加了查询字符串的 URL
    #[inline]
    pub fn to_url(&self) -> String {
        self.to_url_with(&self.resource)
    }

    /// 在指定的资源路径上追加查询字符串
    pub fn to_url_with(&self, resource: &str) -> String {
        if self.params.is_empty() {
            resource.to_owned()
        } else {
            format!("{}?{}", resource, self.query_string())
        }
    }

    /// 是否存在附件
    #[inline]
    pub fn is_multipart(&self) -> bool {
        !self.files.is_empty()
    }

    /// 携带请求体的方法将使用的请求体编码方式
    pub fn body_kind(&self) -> BodyKind<'_> {
        if self.is_multipart() {
            BodyKind::Multipart
        } else if !self.params.is_empty() {
            BodyKind::Form
        } else if let Some(entity) = &self.entity {
            BodyKind::Entity(entity)
        } else {
            BodyKind::Empty
        }
    }

    /// 生成 Multipart 表单，附件在前，参数在后
    pub fn to_multipart(&self) -> Multipart {
        let mut multipart = Multipart::new(self.config.multipart_mode());
        for (name, attachment) in self.files.iter() {
            multipart.add_part(name.to_owned(), Part::attachment(attachment.to_content_body()));
        }
        for param in self.params.iter() {
            multipart.add_part(
                param.name().as_str(),
                Part::text(param.value().as_str(), self.config.text_part_content_type().to_owned()),
            );
        }
        multipart
    }

    /// 构建 HTTP 请求
    ///
    /// 本方法不会读取附件，也不会调用上传进度回调，这些操作在传输层写出请求体时才发生。
    /// 非法的资源路径或 HTTP 头将返回 [`Error::Build`]
    pub fn build(&self, method: Method) -> Result<BuiltRequest> {
        let with_body = encloses_body(&method);
        let mut builder = http::Request::builder().method(method);

        let body = if with_body {
            let kind = self.body_kind();
            debug!("build {} request body for {}", kind, self.resource);
            let body = match kind {
                BodyKind::Multipart => {
                    let multipart = self.to_multipart();
                    builder = builder.header(CONTENT_TYPE, multipart.content_type().into_owned());
                    match &self.listener {
                        Some(listener) => RequestBody::Counting(CountingBody::new(multipart, listener.to_owned())),
                        None => RequestBody::Multipart(multipart),
                    }
                }
                BodyKind::Form => {
                    builder = builder.header(CONTENT_TYPE, APPLICATION_WWW_FORM_URLENCODED.as_ref());
                    RequestBody::Bytes(self.query_string().into_bytes())
                }
                BodyKind::Entity(entity) => {
                    builder = builder.header(CONTENT_TYPE, entity.content_type().as_ref());
                    RequestBody::Bytes(entity.body().to_owned())
                }
                BodyKind::Empty => RequestBody::Empty,
            };
            builder = builder.uri(request_target(&self.resource)?);
            body
        } else {
            if let Some(etag) = &self.if_none_match {
                builder = builder.header(IF_NONE_MATCH, etag.as_str());
            }
            builder = builder.uri(request_target(&self.to_url())?);
            RequestBody::Empty
        };

        if let Some(token) = &self.token {
            let authorizer: &dyn Authorizer = self.authorizer.as_deref().unwrap_or(&OAuthAuthorizer);
            let (name, value) = authorizer.authorization_header(token)?;
            builder = builder.header(name, value);
        }

        let request = builder.body(body)?;
        debug!("built request: {} {}", request.method(), request.uri());
        Ok(request)
    }
}

// 资源路径可以不以 `/` 开头，总是解析为 path-and-query
fn request_target(path_and_query: &str) -> Result<Uri> {
    Ok(Uri::builder().path_and_query(path_and_query).build()?)
}

impl Display for BodyKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Multipart => f.write_str("multipart"),
            Self::Form => f.write_str("form-urlencoded"),
            Self::Entity(_) => f.write_str("raw entity"),
            Self::Empty => f.write_str("empty"),
        }
    }
}

impl From<&str> for Request {
    #[inline]
    fn from(resource: &str) -> Self {
        Self::new(resource)
    }
}

impl From<String> for Request {
    #[inline]
    fn from(resource: String) -> Self {
        Self::new(resource)
    }
}

impl From<&Uri> for Request {
    #[inline]
    fn from(uri: &Uri) -> Self {
        Self::from_uri(uri)
    }
}

impl From<&Url> for Request {
    #[inline]
    fn from(url: &Url) -> Self {
        Self::from_url(url)
    }
}

impl<'a> IntoIterator for &'a Request {
    type Item = &'a Param;
    type IntoIter = Iter<'a, Param>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

impl Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("resource", &self.resource)
            .field("params", &self.params)
            .field("files", &self.files)
            .field("entity", &self.entity)
            .field("token", &self.token)
            .field("authorizer", &self.authorizer)
            .field("listener", &self.listener.as_ref().map_or("Uninstalled", |_| "Installed"))
            .field("if_none_match", &self.if_none_match)
            .field("config", &self.config)
            .finish()
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request{{resource={:?}, params=[", self.resource)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", param.name(), param.value())?;
        }
        f.write_str("], files=[")?;
        for (i, (name, attachment)) in self.files.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, attachment.file_name())?;
        }
        write!(
            f,
            "], entity={}, token={}, listener={}}}",
            self.entity.is_some(),
            self.token.is_some(),
            self.listener.is_some()
        )
    }
}
