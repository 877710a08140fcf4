use http::{
    header::{HeaderName, AUTHORIZATION},
    HeaderValue,
};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// 访问凭证
///
/// 请求构建器不解析凭证内容，只负责将其交给 [`Authorizer`] 生成鉴权头
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    access: Option<String>,
    refresh: Option<String>,
    scope: Option<String>,
}

impl Token {
    /// 创建访问凭证
    #[inline]
    pub fn new(access: impl Into<String>) -> Self {
        Self {
            access: Some(access.into()),
            ..Default::default()
        }
    }

    /// 设置刷新凭证
    #[inline]
    #[must_use]
    pub fn with_refresh(mut self, refresh: impl Into<String>) -> Self {
        self.refresh = Some(refresh.into());
        self
    }

    /// 设置授权范围
    #[inline]
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// 获取访问凭证
    #[inline]
    pub fn access(&self) -> Option<&str> {
        self.access.as_deref()
    }

    /// 获取刷新凭证
    #[inline]
    pub fn refresh(&self) -> Option<&str> {
        self.refresh.as_deref()
    }

    /// 获取授权范围
    #[inline]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// 访问凭证是否存在
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.access.as_deref().map_or(false, |access| !access.is_empty())
    }

    /// 作废访问凭证
    #[inline]
    pub fn invalidate(&mut self) {
        self.access = None;
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access", &self.access.as_ref().map(|_| "[REDACTED]"))
            .field("refresh", &self.refresh.as_ref().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .finish()
    }
}

/// 鉴权头生成接口
///
/// 根据访问凭证生成一个 HTTP 头，实现不应有可观察的副作用
pub trait Authorizer: Debug + Send + Sync {
    /// 生成鉴权头
    fn authorization_header(&self, token: &Token) -> Result<(HeaderName, HeaderValue), http::Error>;
}

/// OAuth 2 鉴权头
///
/// 生成 `Authorization: OAuth <access>`，凭证无效时使用 `invalidated` 占位
#[derive(Debug, Clone, Copy, Default)]
pub struct OAuthAuthorizer;

const INVALIDATED: &str = "invalidated";

impl Authorizer for OAuthAuthorizer {
    fn authorization_header(&self, token: &Token) -> Result<(HeaderName, HeaderValue), http::Error> {
        let access = token.access().filter(|_| token.is_valid()).unwrap_or(INVALIDATED);
        let mut value = HeaderValue::from_str(&format!("OAuth {access}"))?;
        value.set_sensitive(true);
        Ok((AUTHORIZATION, value))
    }
}
