pub mod background;
pub mod storage;
