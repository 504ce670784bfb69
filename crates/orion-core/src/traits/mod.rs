//! Traits (ports) implemented by the infrastructure crates

mod fast_path;
mod relay;
mod repositories;

pub use fast_path::FastPathStore;
pub use relay::{Delivery, RelayConsumer, RelayPublisher};
pub use repositories::{
    CommentRepository, CommentTxRepository, LikeTxRepository, RepoResult, SubjectRepository,
    SubjectTxRepository, TxFuture, TxRepositories, UnitOfWork,
};
