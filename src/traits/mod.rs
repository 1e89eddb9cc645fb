pub mod delay_source;
