pub mod backend;
pub mod syscontrol;
pub mod sysinfo;
