//! UI components module.

pub mod browse;
pub mod now_playing;
pub mod queue;
pub mod search;

pub use browse::{render_browse, render_track_list, BrowsePage, ContentState, TrackListPage, TrackSource};
pub use now_playing::{render_now_playing, NowPlayingLayout, NowPlayingState};
pub use queue::{render_queue, QueueState};
pub use search::{render_search, SearchRequest, SearchState};
