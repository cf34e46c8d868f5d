pub mod outline_post_processing;
