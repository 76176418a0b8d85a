//! Domain error types for the edge-scoping and topic-claim engine.
//!
//! All storage-layer errors are funnelled through a single translator
//! (`From<sea_orm::DbErr>`), so services never branch on storage-specific
//! error types.

pub mod scope;

pub use scope::ScopeError;

/// Result type alias for scoping and claim operations
pub type ScopeResult<T> = Result<T, ScopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_result_alias() {
        let result: ScopeResult<i32> = Err(ScopeError::not_found("project"));
        assert!(result.is_err());
    }
}
