//! Wave assignment
//!
//! A wave is a set of tasks that may run concurrently: no task in a wave
//! depends, directly or transitively, on another task in the same wave.
//! Initial waves are exactly the Kahn rounds; the conflict resolver may later
//! move tasks to higher waves.

use std::collections::VecDeque;

use super::graph::DependencyGraph;
use super::sequence::sort_by_schedule;

/// A task moved by dependency propagation: `(position, from_wave, to_wave)`
pub type WaveMove = (usize, usize, usize);

/// Wave index of every task, keyed by input position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveAssignment {
    wave_of: Vec<usize>,
}

impl WaveAssignment {
    /// Assigns round `k` of Kahn's algorithm to wave `k`
    pub fn from_rounds(rounds: &[Vec<usize>], len: usize) -> Self {
        let mut wave_of = vec![0; len];
        for (wave, round) in rounds.iter().enumerate() {
            for &position in round {
                wave_of[position] = wave;
            }
        }
        Self { wave_of }
    }

    /// Wave index of a task
    pub fn wave_of(&self, position: usize) -> usize {
        self.wave_of[position]
    }

    /// Number of waves (highest index plus one)
    pub fn wave_count(&self) -> usize {
        self.wave_of.iter().max().map_or(0, |max| max + 1)
    }

    /// Tasks in a wave, in scheduling order
    pub fn members(&self, graph: &DependencyGraph<'_>, wave: usize) -> Vec<usize> {
        let mut members: Vec<usize> = (0..self.wave_of.len())
            .filter(|&n| self.wave_of[n] == wave)
            .collect();
        sort_by_schedule(graph, &mut members);
        members
    }

    /// Moves a single task without touching its dependents
    pub fn move_to(&mut self, position: usize, wave: usize) {
        self.wave_of[position] = wave;
    }

    /// Pushes the transitive dependents of `position` forward until every
    /// task sits in a later wave than all of its dependencies
    ///
    /// Returns the tasks that had to move.
    pub fn push_dependents(
        &mut self,
        graph: &DependencyGraph<'_>,
        position: usize,
    ) -> Vec<WaveMove> {
        let mut moved = Vec::new();
        let mut queue = VecDeque::from([position]);

        while let Some(node) = queue.pop_front() {
            let floor = self.wave_of[node] + 1;
            for dependent in graph.dependents(node) {
                let current = self.wave_of[dependent];
                if current < floor {
                    self.wave_of[dependent] = floor;
                    moved.push((dependent, current, floor));
                    queue.push_back(dependent);
                }
            }
        }

        moved
    }

    /// Returns true if every task is in a later wave than its dependencies
    pub fn is_consistent(&self, graph: &DependencyGraph<'_>) -> bool {
        (0..self.wave_of.len()).all(|n| {
            graph
                .dependencies(n)
                .iter()
                .all(|&dep| self.wave_of[dep] < self.wave_of[n])
        })
    }

    /// Collects the waves, each in scheduling order, dropping empty ones
    pub fn into_waves(self, graph: &DependencyGraph<'_>) -> Vec<Vec<usize>> {
        let mut waves: Vec<Vec<usize>> = vec![Vec::new(); self.wave_count()];
        for (position, &wave) in self.wave_of.iter().enumerate() {
            waves[wave].push(position);
        }
        for wave in &mut waves {
            sort_by_schedule(graph, wave);
        }
        waves.retain(|w| !w.is_empty());
        waves
    }
}
