pub mod cleanup;
pub mod operation;
pub mod storage_key;
#[cfg(test)]
mod test;
