mod active_num_traits;
mod active_ops;
