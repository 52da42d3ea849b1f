mod wei;

pub use wei::{ETHER_DECIMALS, Wei};
