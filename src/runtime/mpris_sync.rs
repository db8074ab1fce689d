use crate::app::{App, Transport};
use crate::audio::PlaybackEngine;
use crate::mpris::MprisHandle;

pub fn update_mpris<E: PlaybackEngine>(mpris: &MprisHandle, app: &App<E>) {
    mpris.set_track_metadata(app.transport.current, app.current_track());
    mpris.set_playback(app.status());
    mpris.set_volume(app.transport.volume);
}

/// Push to MPRIS only when the transport moved since the last push.
pub fn sync_mpris<E: PlaybackEngine>(
    mpris: &MprisHandle,
    app: &App<E>,
    last: &mut Option<Transport>,
) {
    if last.as_ref() != Some(&app.transport) {
        update_mpris(mpris, app);
        *last = Some(app.transport);
    }
}
