mod compute_flow;
mod config_file;
mod datasets_flow;
mod object_storage_flow;
