use std::io::{Read, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use excavation_core::TRIAL_RESOLUTION;
use excavation_persistence::{CodecError, GameDataReader, GameDataWriter, Persistable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Exclusive upper bound of the values drawn from the meta track.
const SEED_CEILING: u32 = i32::MAX as u32;

/// Seeded source of reward trials with two independent state tracks.
///
/// The session track drives every trial made during play and is what save
/// files capture. The meta track only derives new session seeds on restart,
/// so consecutive restarts differ even when the host clock barely moved.
#[derive(Clone, Debug)]
pub struct RewardRng {
    session: ChaCha8Rng,
    meta: ChaCha8Rng,
}

impl RewardRng {
    /// Creates a generator whose tracks both start from the provided seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        let meta = ChaCha8Rng::seed_from_u64(seed);
        Self {
            session: meta.clone(),
            meta,
        }
    }

    /// Creates a generator seeded from wall-clock time.
    #[must_use]
    pub fn from_clock(now: SystemTime) -> Self {
        let nanos = now
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        Self::from_seed(nanos)
    }

    /// Derives a fresh session seed from the meta track mixed with host uptime.
    pub fn reseed_for_session(&mut self, uptime: Duration) {
        let draw = self.meta.gen_range(0..SEED_CEILING);
        let seconds = u32::try_from(uptime.as_secs()).unwrap_or(u32::MAX);
        self.session = ChaCha8Rng::seed_from_u64(u64::from(draw ^ seconds));
    }

    /// Runs a bounded-probability trial on the session track.
    ///
    /// A value is drawn uniformly from `[0, TRIAL_RESOLUTION]` and the trial
    /// succeeds when it falls below `probability * TRIAL_RESOLUTION`,
    /// truncated to an integer.
    pub fn trial(&mut self, probability: f32) -> bool {
        let roll = self.session.gen_range(0..=TRIAL_RESOLUTION);
        let threshold = (probability * TRIAL_RESOLUTION as f32) as i32;
        (0..threshold).contains(&roll)
    }

    /// Captures the session track.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        SessionState(self.session.clone())
    }

    /// Replaces the session track, leaving the meta track untouched.
    pub fn restore_session(&mut self, state: SessionState) {
        self.session = state.0;
    }
}

/// Serialisable snapshot of the session track of a [`RewardRng`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState(ChaCha8Rng);

impl Default for SessionState {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(0))
    }
}

impl Persistable for SessionState {
    fn save<W: Write>(&self, writer: &mut GameDataWriter<W>) -> Result<(), CodecError> {
        writer.write_state_blob(&self.0)
    }

    fn load<R: Read>(&mut self, reader: &mut GameDataReader<R>) -> Result<(), CodecError> {
        self.0 = reader.read_state_blob()?;
        Ok(())
    }
}
