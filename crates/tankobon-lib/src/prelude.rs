pub use crate::error::{SourceError, SourceResult};
pub use crate::models::*;
pub use crate::pagination::{
    IncompleteReason, Page, PageRequest, PageTotal, Paginated, PaginationConfig,
    PaginationStatus, paginate,
};
pub use crate::retry::RetryPolicy;
pub use crate::traits::Source;
