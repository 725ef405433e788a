pub mod rpc;
pub mod run;
