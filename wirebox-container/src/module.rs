//! Module trait: a named group of related registrations.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! struct Pool { size: usize }
//!
//! struct DatabaseModule { pool_size: usize }
//!
//! impl Module for DatabaseModule {
//!     fn register(&self, container: &Container) -> Result<()> {
//!         let size = self.pool_size;
//!         container.register_singleton(Token::of::<Pool>(), Provider::factory(move |_| Ok(Pool { size })))?;
//!         container.register_type("IPool", Token::of::<Pool>())?;
//!         Ok(())
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_module(&DatabaseModule { pool_size: 8 }).unwrap();
//!
//! let pool: Arc<Pool> = container.resolve("IPool").unwrap();
//! assert_eq!(pool.size, 8);
//! ```

use crate::container::Container;
use crate::error::Result;

/// A unit of registrations applied to a container in one call.
pub trait Module: Send + Sync {
    /// Register this module's providers.
    fn register(&self, container: &Container) -> Result<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
