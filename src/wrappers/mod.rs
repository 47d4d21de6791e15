// Wrappers composing over any `Env`.

use crate::core::{Env, Info, InfoValue, RenderFrame, Result, Step};

/// RecordEpisodeStatistics tracks cumulative return and episode length.
/// On episode end (terminated or truncated), it injects keys into the returned Step's Info:
/// - "episode_return": f64
/// - "episode_length": i64
pub struct RecordEpisodeStatistics<E: Env> {
    inner: E,
    ep_return: f64,
    ep_length: i64,
    last_episode: Option<(f64, i64)>,
}

impl<E: Env> RecordEpisodeStatistics<E> {
    pub fn new(inner: E) -> Self { Self { inner, ep_return: 0.0, ep_length: 0, last_episode: None } }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }

    /// (return, length) of the most recently finished episode.
    pub fn last_episode(&self) -> Option<(f64, i64)> { self.last_episode }
}

impl<E: Env> Env for RecordEpisodeStatistics<E> {
    type Obs = E::Obs;
    type Act = E::Act;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)> {
        self.ep_return = 0.0;
        self.ep_length = 0;
        self.inner.reset(seed)
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        let mut s = self.inner.step(action)?;
        self.ep_return += s.reward as f64;
        self.ep_length += 1;
        if s.done() {
            s.info.insert("episode_return", InfoValue::from(self.ep_return));
            s.info.insert("episode_length", InfoValue::from(self.ep_length));
            self.last_episode = Some((self.ep_return, self.ep_length));
            self.ep_return = 0.0;
            self.ep_length = 0;
        }
        Ok(s)
    }

    fn render(&self) -> Option<RenderFrame> { self.inner.render() }
    fn close(&mut self) { self.inner.close() }
}
