mod cli;
mod files;
mod gallery;
mod loader;
mod ui;

use clap::Parser;
use std::sync::{Arc, Condvar, Mutex};
use winit::event_loop::EventLoop;

use crate::cli::{default_memory_budget, parse_memory_budget, Cli};
use crate::files::collect_photos;
use crate::gallery::Gallery;
use crate::loader::{spawn_decode_workers, CacheState, SharedState, UserEvent};
use crate::ui::view::ViewModel;
use crate::ui::{App, DeadlineTimer};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let budget = match &cli.memory {
        Some(s) => parse_memory_budget(s),
        None => default_memory_budget(),
    };

    let photos = collect_photos(&cli.paths, cli.file_list.as_ref(), cli.recursive);
    if photos.is_empty() {
        log::error!("No photo files found.");
        return;
    }

    let photos = Arc::new(photos);
    let photo_count = photos.len();

    let shared: SharedState = Arc::new((
        Mutex::new(CacheState::new(budget, photo_count)),
        Condvar::new(),
    ));

    let num_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(4, 16);

    let event_loop = EventLoop::<UserEvent>::with_user_event().build().expect("create event loop");
    let proxy = event_loop.create_proxy();

    // Spawn workers — they immediately start decoding from index 0 outward
    spawn_decode_workers(Arc::clone(&shared), Arc::clone(&photos), proxy, num_threads);
    {
        let (_, cvar) = &*shared;
        cvar.notify_all();
    }

    let gallery = match Gallery::new(
        Arc::clone(&photos),
        cli.gallery_config(),
        ViewModel::new(),
        DeadlineTimer::default(),
    ) {
        Ok(g) => g,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };

    let mut app = App::new(gallery, shared);

    event_loop.run_app(&mut app).expect("run event loop");
}
