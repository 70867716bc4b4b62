//! Adwaita Core Runtime
//!
//! The narrow host-toolkit boundary the animation engine and the animated
//! widgets are built on:
//!
//! - **Geometry**: points and 2D affine transforms
//! - **Frame Clock**: vsync-aligned tick callbacks with monotonic timestamps
//! - **Widget Host**: map/unmap lifecycle, measurement and allocation
//! - **Signals**: synchronous, same-thread observer lists
//! - **Settings**: animation toggles and defaults, loadable from TOML
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use adw_core::{FrameClock, ManualFrameClock, TickControl};
//!
//! let clock = Rc::new(ManualFrameClock::new());
//! clock.add_tick_callback(Box::new(|frame_time| {
//!     println!("frame at {frame_time}us");
//!     TickControl::Remove
//! }));
//!
//! clock.advance(16);
//! assert_eq!(clock.n_tick_callbacks(), 0);
//! ```

pub mod error;
pub mod frame_clock;
pub mod geometry;
pub mod settings;
pub mod signal;
pub mod widget;

pub use error::{ConfigError, Result};
pub use frame_clock::{FrameClock, ManualFrameClock, TickCallback, TickCallbackId, TickControl};
pub use geometry::{Affine2D, Point};
pub use settings::{CarouselSettings, Settings, SpringSettings};
pub use signal::{HandlerId, Signal};
pub use widget::{Allocation, Host, Orientation, TextDirection, Widget};
