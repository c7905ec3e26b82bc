//! Plain downloads outside a mirror run
//!
//! - `single`: one URL to one file, with status lines and a progress bar
//! - `batch`: a URL list file downloaded as independent concurrent tasks
//!
//! Both share the crawler's HTTP client builder and byte-rate limiter.

mod batch;
mod progress;
mod single;

pub use batch::{
    display_name, download_batch, download_from_file, parse_url_list, head_content_sizes,
    read_url_list,
};
pub use progress::{ProgressTracker, PROGRESS_TEMPLATE, REDRAW_HZ};
pub use single::{default_file_name, download_file, output_file_path, TIME_FORMAT};
