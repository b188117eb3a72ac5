pub mod pno;
pub mod scan;
pub mod status;
