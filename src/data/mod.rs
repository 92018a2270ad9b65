pub mod discovery;
pub mod run_params;
pub mod table;
