pub mod daily_batch_use_case;
pub mod ports;
