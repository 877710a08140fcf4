use anyhow::Result as AnyResult;

/// 上传进度回调
///
/// 在请求体序列化期间被调用，参数为累计已传输的字节数，保证单调不减。
/// 返回错误将终止本次传输。
pub trait TransferListener: Send + Sync {
    /// 通知累计已传输的字节数
    fn transferred(&self, amount: u64) -> AnyResult<()>;
}

impl<F: Fn(u64) -> AnyResult<()> + Send + Sync> TransferListener for F {
    #[inline]
    fn transferred(&self, amount: u64) -> AnyResult<()> {
        self(amount)
    }
}
