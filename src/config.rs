use super::multipart::{FileName, MultipartMode};
use mime::{Mime, TEXT_PLAIN_UTF_8};
use once_cell::sync::Lazy;

static DEFAULT: Lazy<Config> = Lazy::new(|| ConfigBuilder::new().build());

const DEFAULT_UPLOAD_FILE_NAME: &str = "upload";

/// 请求构建配置
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    multipart_mode: MultipartMode,
    default_upload_file_name: FileName,
    text_part_content_type: Mime,
}

impl Config {
    /// 创建请求构建配置构建器
    #[inline]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Multipart 编码模式
    #[inline]
    pub fn multipart_mode(&self) -> MultipartMode {
        self.multipart_mode
    }

    /// 内存数据未指定文件名时使用的上传文件名
    #[inline]
    pub fn default_upload_file_name(&self) -> &FileName {
        &self.default_upload_file_name
    }

    /// Multipart 文本组件的 MIME 类型
    #[inline]
    pub fn text_part_content_type(&self) -> &Mime {
        &self.text_part_content_type
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        DEFAULT.to_owned()
    }
}

/// 请求构建配置构建器
#[derive(Debug)]
pub struct ConfigBuilder(Config);

impl Default for ConfigBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// 创建请求构建配置构建器
    #[inline]
    pub fn new() -> Self {
        Self(Config {
            multipart_mode: MultipartMode::BrowserCompatible,
            default_upload_file_name: DEFAULT_UPLOAD_FILE_NAME.into(),
            text_part_content_type: TEXT_PLAIN_UTF_8,
        })
    }

    /// 设置 Multipart 编码模式
    #[inline]
    pub fn multipart_mode(&mut self, multipart_mode: MultipartMode) -> &mut Self {
        self.0.multipart_mode = multipart_mode;
        self
    }

    /// 设置内存数据未指定文件名时使用的上传文件名
    #[inline]
    pub fn default_upload_file_name(&mut self, file_name: impl Into<FileName>) -> &mut Self {
        self.0.default_upload_file_name = file_name.into();
        self
    }

    /// 设置 Multipart 文本组件的 MIME 类型
    #[inline]
    pub fn text_part_content_type(&mut self, content_type: Mime) -> &mut Self {
        self.0.text_part_content_type = content_type;
        self
    }

    /// 构建请求构建配置
    #[inline]
    pub fn build(&mut self) -> Config {
        self.0.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        env_logger::builder().is_test(true).try_init().ok();

        let config = Config::default();
        assert_eq!(config.multipart_mode(), MultipartMode::BrowserCompatible);
        assert_eq!(config.default_upload_file_name(), "upload");
        assert_eq!(config.text_part_content_type(), &TEXT_PLAIN_UTF_8);
    }

    #[test]
    fn test_config_builder() {
        env_logger::builder().is_test(true).try_init().ok();

        let config = Config::builder()
            .multipart_mode(MultipartMode::Strict)
            .default_upload_file_name("blob.bin")
            .text_part_content_type(mime::TEXT_PLAIN)
            .build();
        assert_eq!(config.multipart_mode(), MultipartMode::Strict);
        assert_eq!(config.default_upload_file_name(), "blob.bin");
        assert_eq!(config.text_part_content_type(), &mime::TEXT_PLAIN);
    }
}
