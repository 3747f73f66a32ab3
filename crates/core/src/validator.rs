use async_trait::async_trait;

/// Decides whether a cached or stored value can be served without refetching.
///
/// Network responses are never validated.
#[async_trait]
pub trait Validator<O>: Send + Sync {
    async fn is_valid(&self, item: &O) -> bool;
}
