//! Redis error mapping.

use refdata_core::cache::CacheError;
use refdata_core::events::DispatchError;

/// Maps Redis errors to CacheError.
pub fn map_redis_error(err: redis::RedisError) -> CacheError {
    if err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped() {
        CacheError::ConnectionFailed(err.to_string())
    } else {
        CacheError::OperationFailed(err.to_string())
    }
}

/// Maps Redis errors raised while publishing events.
pub fn map_publish_error(err: redis::RedisError) -> DispatchError {
    DispatchError::PublishFailed(err.to_string())
}

/// Maps Redis errors raised while subscribing to events.
pub fn map_subscribe_error(err: redis::RedisError) -> DispatchError {
    DispatchError::SubscribeFailed(err.to_string())
}
