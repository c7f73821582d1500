pub(crate) mod limits;
pub(crate) mod meta;
pub(crate) mod report;
pub(crate) mod shared;
