//! Bankable channels and track navigation
//!
//! A bank is N channel strips mapped onto a scrollable window over the
//! host's visible track list. Individual channels can be pinned: a pinned
//! channel keeps its track across scrolling and relayout, and its record is
//! persisted per `(page, slot)` through the host's extended state so pins
//! survive restarts.

use crate::host::{HostFacade, TrackRef, ViewMode};
use crate::widget::WidgetId;
use tracing::{debug, info};

/// One slot of a scrollable channel-strip bank.
#[derive(Debug)]
pub struct BankableChannel {
    widgets: Vec<WidgetId>,
    track: Option<TrackRef>,
    pinned: bool,
}

impl BankableChannel {
    pub fn new(widgets: Vec<WidgetId>) -> Self {
        Self {
            widgets,
            track: None,
            pinned: false,
        }
    }

    pub fn widgets(&self) -> &[WidgetId] {
        &self.widgets
    }

    pub fn track(&self) -> Option<&TrackRef> {
        self.track.as_ref()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}

/// Assigns a track identity to each bank slot and owns the scroll offset.
#[derive(Debug)]
pub struct TrackNavigator {
    /// Extended-state section scoping persisted pins (the page name).
    section: String,
    view: ViewMode,
    offset: isize,
    channels: Vec<BankableChannel>,
    last_visible_count: usize,
}

impl TrackNavigator {
    pub fn new(section: impl Into<String>, view: ViewMode, channels: Vec<BankableChannel>) -> Self {
        Self {
            section: section.into(),
            view,
            offset: 0,
            channels,
            last_visible_count: 0,
        }
    }

    pub fn channels(&self) -> &[BankableChannel] {
        &self.channels
    }

    pub fn offset(&self) -> isize {
        self.offset
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// The bank slot owning `widget`, if it belongs to a channel strip.
    pub fn channel_for_widget(&self, widget: WidgetId) -> Option<usize> {
        self.channels
            .iter()
            .position(|c| c.widgets.contains(&widget))
    }

    fn pinned_count(&self) -> usize {
        self.channels.iter().filter(|c| c.pinned).count()
    }

    fn claimed_by_pin(&self, track: &TrackRef) -> bool {
        self.channels
            .iter()
            .any(|c| c.pinned && c.track.as_ref() == Some(track))
    }

    fn slot_key(slot: usize) -> String {
        format!("Channel{}", slot + 1)
    }

    /// Move the scroll offset by `stride`, clamped so the window neither
    /// scrolls past the last visible track nor (allowing for pinned slots)
    /// entirely off the front, then walk in the stride direction past any
    /// anchor claimed by a pinned channel.
    pub fn adjust_bank(&mut self, host: &dyn HostFacade, stride: isize) {
        let visible = host.visible_tracks(self.view);
        let n = self.channels.len() as isize;
        if n == 0 || visible.is_empty() {
            return;
        }

        let lower = 1 - n + self.pinned_count() as isize;
        let upper = (visible.len() as isize - n).max(lower);
        let mut target = (self.offset + stride).clamp(lower, upper);
        let dir: isize = if stride >= 0 { 1 } else { -1 };

        while (lower..=upper).contains(&target) {
            let anchored = if target < 0 {
                // Blank lead-in slots are always a valid anchor
                true
            } else {
                match visible.get(target as usize) {
                    Some(t) => !self.claimed_by_pin(t),
                    None => true,
                }
            };
            if anchored {
                debug!("bank offset {} -> {}", self.offset, target);
                self.offset = target;
                return;
            }
            target += dir;
        }
        // Bounds exhausted without a free anchor; keep the current offset.
    }

    /// Three-phase merge of pinned and movable tracks into a slot layout.
    ///
    /// 1. Pinned channels claim their slot positions.
    /// 2. A movable sequence is walked from the scroll offset, one entry
    ///    per slot, with pin-claimed tracks removed (they do not consume a
    ///    movable position) and out-of-range positions left blank.
    /// 3. Unpinned slots are filled, in order, from the sequence.
    fn compute_layout(&self, visible: &[TrackRef]) -> Vec<Option<TrackRef>> {
        let n = self.channels.len();
        let mut layout: Vec<Option<TrackRef>> = self
            .channels
            .iter()
            .map(|c| if c.pinned { c.track.clone() } else { None })
            .collect();

        let mut movable: Vec<Option<TrackRef>> = Vec::with_capacity(n);
        let mut idx = self.offset;
        while movable.len() < n {
            if idx < 0 || idx >= visible.len() as isize {
                movable.push(None);
                idx += 1;
                continue;
            }
            let track = &visible[idx as usize];
            idx += 1;
            if self.claimed_by_pin(track) {
                continue;
            }
            movable.push(Some(track.clone()));
        }

        let mut movable = movable.into_iter();
        for (channel, slot) in self.channels.iter().zip(layout.iter_mut()) {
            // A pinned slot never takes from the movable sequence, even
            // when it is pinned while blank.
            if !channel.pinned && slot.is_none() {
                *slot = movable.next().flatten();
            }
        }
        layout
    }

    /// Recompute and apply the bank layout. Pinned channels are untouched.
    pub fn refresh_layout(&mut self, host: &dyn HostFacade) {
        let visible = host.visible_tracks(self.view);
        let layout = self.compute_layout(&visible);
        for (channel, track) in self.channels.iter_mut().zip(layout) {
            if !channel.pinned {
                channel.track = track;
            }
        }
        self.last_visible_count = visible.len();
    }

    /// Detect whether the host's track list drifted from the applied
    /// layout (tracks added/removed/reordered, pinned tracks deleted).
    /// Reports only; never rewrites the layout itself, except that pinned
    /// channels whose track vanished are auto-unpinned and their persisted
    /// record cleared.
    pub fn track_list_changed(&mut self, host: &dyn HostFacade) -> bool {
        let mut dirty = false;

        for slot in 0..self.channels.len() {
            let channel = &self.channels[slot];
            if !channel.pinned {
                continue;
            }
            let dead = channel
                .track
                .as_ref()
                .map(|t| !host.is_track_valid(t))
                .unwrap_or(true);
            if dead {
                info!("pinned track on slot {} vanished, unpinning", slot + 1);
                let channel = &mut self.channels[slot];
                channel.pinned = false;
                channel.track = None;
                host.delete_ext_state(&self.section, &Self::slot_key(slot));
                dirty = true;
            }
        }

        let visible = host.visible_tracks(self.view);
        if visible.len() != self.last_visible_count {
            return true;
        }
        if !dirty {
            let expected = self.compute_layout(&visible);
            for (channel, track) in self.channels.iter().zip(&expected) {
                if !channel.pinned && channel.track.as_ref() != track.as_ref() {
                    return true;
                }
            }
        }
        dirty
    }

    /// Pin a slot to its current track and persist the record.
    pub fn pin(&mut self, host: &dyn HostFacade, slot: usize) {
        let Some(channel) = self.channels.get_mut(slot) else {
            return;
        };
        channel.pinned = true;
        if let Some(track) = &channel.track {
            info!("pinned slot {} to {}", slot + 1, track);
            host.set_ext_state(&self.section, &Self::slot_key(slot), track.as_str());
        }
    }

    /// Unpin a slot and clear its persisted record.
    pub fn unpin(&mut self, host: &dyn HostFacade, slot: usize) {
        let Some(channel) = self.channels.get_mut(slot) else {
            return;
        };
        channel.pinned = false;
        host.delete_ext_state(&self.section, &Self::slot_key(slot));
        info!("unpinned slot {}", slot + 1);
    }

    /// Toggle a slot's pin. Returns the new pinned state.
    pub fn toggle_pin(&mut self, host: &dyn HostFacade, slot: usize) -> bool {
        let pinned = self
            .channels
            .get(slot)
            .map(|c| c.pinned)
            .unwrap_or(false);
        if pinned {
            self.unpin(host, slot);
        } else {
            self.pin(host, slot);
        }
        !pinned
    }

    /// Restore persisted pins. Records whose track no longer resolves are
    /// discarded.
    pub fn restore_pins(&mut self, host: &dyn HostFacade) {
        for slot in 0..self.channels.len() {
            let key = Self::slot_key(slot);
            let Some(value) = host.ext_state(&self.section, &key) else {
                continue;
            };
            let track = TrackRef::new(value);
            if host.is_track_valid(&track) {
                debug!("restored pin: slot {} -> {}", slot + 1, track);
                let channel = &mut self.channels[slot];
                channel.track = Some(track);
                channel.pinned = true;
            } else {
                host.delete_ext_state(&self.section, &key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use proptest::prelude::*;

    fn navigator(n: usize) -> TrackNavigator {
        let channels = (0..n).map(|_| BankableChannel::new(Vec::new())).collect();
        TrackNavigator::new("Mixer", ViewMode::Mixer, channels)
    }

    fn tracks_of(nav: &TrackNavigator) -> Vec<Option<TrackRef>> {
        nav.channels().iter().map(|c| c.track.clone()).collect()
    }

    #[test]
    fn test_scroll_scenario_clamps_at_top() {
        // 8 channels over 12 visible tracks
        let host = MockHost::with_tracks(12);
        let visible = host.visible_tracks(ViewMode::Mixer);
        let mut nav = navigator(8);

        nav.refresh_layout(&host);
        for (i, t) in tracks_of(&nav).iter().enumerate() {
            assert_eq!(t.as_ref(), Some(&visible[i]));
        }

        nav.adjust_bank(&host, 4);
        nav.refresh_layout(&host);
        for (i, t) in tracks_of(&nav).iter().enumerate() {
            assert_eq!(t.as_ref(), Some(&visible[i + 4]));
        }

        // Top bound reached: no further shift
        nav.adjust_bank(&host, 4);
        nav.refresh_layout(&host);
        for (i, t) in tracks_of(&nav).iter().enumerate() {
            assert_eq!(t.as_ref(), Some(&visible[i + 4]));
        }
    }

    #[test]
    fn test_pin_stability_across_scroll() {
        let host = MockHost::with_tracks(20);
        let visible = host.visible_tracks(ViewMode::Mixer);
        let mut nav = navigator(8);
        nav.refresh_layout(&host);

        // Pin channel 3 (slot index 2) to its current track
        let pinned_track = visible[2].clone();
        nav.pin(&host, 2);

        nav.adjust_bank(&host, 5);
        nav.refresh_layout(&host);

        assert_eq!(nav.channels()[2].track(), Some(&pinned_track));
        assert!(nav.channels()[2].is_pinned());
        let holders = nav
            .channels()
            .iter()
            .filter(|c| c.track() == Some(&pinned_track))
            .count();
        assert_eq!(holders, 1, "pinned track must not appear twice");
        // Persisted record exists
        assert_eq!(
            host.ext_state("Mixer", "Channel3").as_deref(),
            Some(pinned_track.as_str())
        );
    }

    #[test]
    fn test_pinned_track_does_not_starve_movable_slots() {
        let host = MockHost::with_tracks(10);
        let visible = host.visible_tracks(ViewMode::Mixer);
        let mut nav = navigator(4);
        nav.refresh_layout(&host);

        // Pin slot 0 to track 0, then scroll away; the pinned track is
        // removed from the movable sequence so slots 1..4 get 3 fresh
        // tracks, not 2.
        nav.pin(&host, 0);
        nav.refresh_layout(&host);
        assert_eq!(nav.channels()[0].track(), Some(&visible[0]));
        assert_eq!(nav.channels()[1].track(), Some(&visible[1]));

        // Scroll +2: anchor 2 is free (the pin claims track 0), movable
        // sequence is tracks 2,3,4
        nav.adjust_bank(&host, 2);
        nav.refresh_layout(&host);
        assert_eq!(nav.channels()[0].track(), Some(&visible[0]));
        assert_eq!(nav.channels()[1].track(), Some(&visible[2]));
        assert_eq!(nav.channels()[2].track(), Some(&visible[3]));
        assert_eq!(nav.channels()[3].track(), Some(&visible[4]));
    }

    #[test]
    fn test_blank_pinned_slot_does_not_consume_tracks() {
        // Pin a slot that has no track yet; a track added later must land
        // on the remaining unpinned slot instead of vanishing into the
        // pinned blank.
        let host = MockHost::with_tracks(2);
        let mut nav = navigator(4);
        nav.refresh_layout(&host);
        assert_eq!(nav.channels()[2].track(), None);
        nav.pin(&host, 2);

        let new_track = host.add_track("Track 3");
        nav.refresh_layout(&host);
        assert_eq!(nav.channels()[2].track(), None);
        assert_eq!(nav.channels()[3].track(), Some(&new_track));
    }

    #[test]
    fn test_scroll_skips_pin_claimed_anchor() {
        let host = MockHost::with_tracks(12);
        let visible = host.visible_tracks(ViewMode::Mixer);
        let mut nav = navigator(4);
        nav.refresh_layout(&host);

        // Pin slot 0 to track 2, then scroll +2: anchor index 2 is claimed
        // by the pin, so the walk lands on 3.
        nav.channels[0].track = Some(visible[2].clone());
        nav.pin(&host, 0);
        nav.adjust_bank(&host, 2);
        assert_eq!(nav.offset(), 3);
    }

    #[test]
    fn test_negative_offset_leaves_blank_lead() {
        let host = MockHost::with_tracks(6);
        let visible = host.visible_tracks(ViewMode::Mixer);
        let mut nav = navigator(4);
        nav.refresh_layout(&host);
        nav.pin(&host, 3); // pinned_count=1 lowers the clamp to -2

        nav.adjust_bank(&host, -2);
        nav.refresh_layout(&host);
        assert_eq!(nav.offset(), -2);
        let layout = tracks_of(&nav);
        assert_eq!(layout[0], None);
        assert_eq!(layout[1], None);
        assert_eq!(layout[2].as_ref(), Some(&visible[0]));
    }

    #[test]
    fn test_track_list_changed_detects_drift() {
        let host = MockHost::with_tracks(8);
        let mut nav = navigator(4);
        nav.refresh_layout(&host);
        assert!(!nav.track_list_changed(&host));

        host.add_track("New Track");
        assert!(nav.track_list_changed(&host));
        nav.refresh_layout(&host);
        assert!(!nav.track_list_changed(&host));
    }

    #[test]
    fn test_dead_pin_auto_unpins() {
        let host = MockHost::with_tracks(6);
        let visible = host.visible_tracks(ViewMode::Mixer);
        let mut nav = navigator(4);
        nav.refresh_layout(&host);
        nav.pin(&host, 1);
        assert!(host.ext_state("Mixer", "Channel2").is_some());

        host.remove_track(&visible[1]);
        assert!(nav.track_list_changed(&host));
        assert!(!nav.channels()[1].is_pinned());
        assert!(host.ext_state("Mixer", "Channel2").is_none());
    }

    #[test]
    fn test_restore_pins() {
        let host = MockHost::with_tracks(6);
        let visible = host.visible_tracks(ViewMode::Mixer);
        host.set_ext_state("Mixer", "Channel2", visible[4].as_str());
        host.set_ext_state("Mixer", "Channel3", "{track-gone}");

        let mut nav = navigator(4);
        nav.restore_pins(&host);
        nav.refresh_layout(&host);

        assert!(nav.channels()[1].is_pinned());
        assert_eq!(nav.channels()[1].track(), Some(&visible[4]));
        assert!(!nav.channels()[2].is_pinned());
        // Stale record is discarded
        assert!(host.ext_state("Mixer", "Channel3").is_none());
    }

    #[test]
    fn test_invisible_tracks_are_skipped() {
        let host = MockHost::with_tracks(6);
        let all = host.visible_tracks(ViewMode::Mixer);
        host.set_track_visible(&all[1], false, true);

        let mut nav = navigator(4);
        nav.refresh_layout(&host);
        let layout = tracks_of(&nav);
        assert_eq!(layout[0].as_ref(), Some(&all[0]));
        assert_eq!(layout[1].as_ref(), Some(&all[2]));
    }

    proptest! {
        /// For any mix of track count, bank size, pins and scrolling, a
        /// live track never lands on two channels at once.
        #[test]
        fn prop_no_double_assignment(
            track_count in 1usize..24,
            bank_size in 1usize..10,
            pin_slots in proptest::collection::vec(0usize..10, 0..4),
            strides in proptest::collection::vec(-6isize..6, 0..6),
        ) {
            let host = MockHost::with_tracks(track_count);
            let mut nav = navigator(bank_size);
            nav.refresh_layout(&host);

            for slot in pin_slots {
                if slot < bank_size && nav.channels()[slot].track().is_some() {
                    nav.pin(&host, slot);
                }
            }
            for stride in strides {
                nav.adjust_bank(&host, stride);
                nav.refresh_layout(&host);

                let mut seen = std::collections::HashSet::new();
                for channel in nav.channels() {
                    if let Some(track) = channel.track() {
                        prop_assert!(
                            seen.insert(track.as_str().to_string()),
                            "track {} assigned twice", track
                        );
                    }
                }
            }
        }
    }
}
