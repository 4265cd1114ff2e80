mod core;
mod request;

pub use core::{Table, TableBuilder};
pub use request::{
    DeleteRequest, GetRequest, PutRequest, QueryRequest, ScanRequest, UpdateRequest,
};
