//! UCI option declarations and the work queue they feed into the driver loop.
//! `spec.md` §6: "UCI options surfaced: Hash ..., Threads ..., optional tunable
//! integers". Grounded on `pleco_engine/src/uci/options.rs`'s `UCIOption`
//! trait/`OptionsMap` shape (a sorted `Vec<Box<dyn UCIOption>>` plus a pending
//! `OptionWork` queue the driver drains after every `setoption`), extended with
//! one `OptionWork::Param` variant that carries a plain `fn(&mut SearchParams,
//! i32)` setter so every search tunable can reuse the same `UCISpin` plumbing
//! without a bespoke enum arm per constant.

use std::collections::VecDeque;

use crate::search::SearchParams;

/// Deferred work produced by applying an option, drained by the driver loop
/// between commands (never mid-search: `spec.md` §7 error-handling implies
/// option application is a protocol-level concern, not a search-internal one).
pub enum OptionWork {
    ClearTT,
    ResizeTT(usize),
    Threads(usize),
    Param(fn(&mut SearchParams, i32), i32),
}

pub struct OptionsMap {
    map: Vec<Box<dyn UCIOption>>,
    work: VecDeque<OptionWork>,
}

impl OptionsMap {
    pub fn new() -> OptionsMap {
        let mut map: Vec<Box<dyn UCIOption>> = vec![
            Self::clear_hash(),
            Self::resize_hash(),
            Self::threads(),
            Self::spin("IIRMinDepth", 4, 1, 20, |p, v| p.iir_min_depth = v),
            Self::spin("IIRDepthReduction", 1, 0, 5, |p, v| p.iir_depth_reduction = v),
            Self::spin("RFPMaxDepth", 8, 0, 20, |p, v| p.rfp_max_depth = v),
            Self::spin("RFPMargin", 75, 0, 400, |p, v| p.rfp_margin = v),
            Self::spin("NMPMinDepth", 3, 1, 20, |p, v| p.nmp_min_depth = v),
            Self::spin("NMPBaseReduction", 3, 0, 10, |p, v| p.nmp_base_reduction = v),
            Self::spin("NMPDepthReductionDivisor", 4, 1, 10, |p, v| {
                p.nmp_depth_reduction_divisor = v
            }),
            Self::spin("LMPBase", 3, 0, 20, |p, v| p.lmp_base = v),
            Self::spin("LMPScale", 2, 0, 20, |p, v| p.lmp_scale = v),
            Self::spin("LMRBase", 75, 0, 300, |p, v| p.lmr_base = v),
            Self::spin("LMRDivisor", 195, 50, 500, |p, v| p.lmr_divisor = v),
            Self::spin("AWMinDepth", 4, 1, 20, |p, v| p.aw_min_depth = v),
            Self::spin("AWFirstWindow", 25, 1, 200, |p, v| p.aw_first_window = v),
            Self::spin("AWWideningFactor", 50, 0, 300, |p, v| p.aw_widening_factor = v),
            Self::spin("MaxSearchDepth", 128, 1, 246, |p, v| p.max_search_depth = v),
        ];
        map.sort_by(|a, b| a.option_name().cmp(b.option_name()));
        OptionsMap { map, work: VecDeque::new() }
    }

    /// Applies a `setoption name <N> value <V>` command. Returns whether the
    /// option was recognized and the value accepted.
    pub fn apply_option(&mut self, name: &str, value: &str) -> bool {
        for op in self.map.iter() {
            if op.option_name().eq_ignore_ascii_case(name) {
                if let Some(work) = op.mutate(value) {
                    self.work.push_back(work);
                    return true;
                }
                return false;
            }
        }
        false
    }

    pub fn display_all(&self) {
        for op in self.map.iter() {
            println!("{}", op.display());
        }
    }

    pub fn drain_work(&mut self) -> std::collections::vec_deque::Drain<'_, OptionWork> {
        self.work.drain(..)
    }

    fn clear_hash() -> Box<dyn UCIOption> {
        Box::new(UCIButton {
            option_name: "Clear Hash",
            mutator: || Some(OptionWork::ClearTT),
        })
    }

    fn resize_hash() -> Box<dyn UCIOption> {
        Box::new(UCISpinImpl {
            option_name: "Hash",
            default: 16,
            min: 1,
            max: 32768,
            mutator: |x: i32| Some(OptionWork::ResizeTT(x as usize)),
        })
    }

    fn threads() -> Box<dyn UCIOption> {
        Box::new(UCISpinImpl {
            option_name: "Threads",
            default: 1,
            min: 1,
            max: 512,
            mutator: |x: i32| Some(OptionWork::Threads(x as usize)),
        })
    }

    fn spin(
        name: &'static str,
        default: i32,
        min: i32,
        max: i32,
        setter: fn(&mut SearchParams, i32),
    ) -> Box<dyn UCIOption> {
        struct Tunable {
            name: &'static str,
            default: i32,
            min: i32,
            max: i32,
            setter: fn(&mut SearchParams, i32),
        }
        impl UCIOption for Tunable {
            fn option_type(&self) -> &'static str {
                "spin"
            }
            fn option_name(&self) -> &'static str {
                self.name
            }
            fn partial_display(&self) -> Option<String> {
                Some(format!("default {} min {} max {}", self.default, self.min, self.max))
            }
            fn mutate(&self, val: &str) -> Option<OptionWork> {
                let v: i32 = val.trim().parse().ok()?;
                if v < self.min || v > self.max {
                    return None;
                }
                Some(OptionWork::Param(self.setter, v))
            }
        }
        Box::new(Tunable { name, default, min, max, setter })
    }
}

impl Default for OptionsMap {
    fn default() -> OptionsMap {
        OptionsMap::new()
    }
}

pub trait UCIOption {
    fn option_type(&self) -> &'static str;
    fn option_name(&self) -> &'static str;
    fn partial_display(&self) -> Option<String>;

    fn display(&self) -> String {
        let mut s = format!("option name {} type {}", self.option_name(), self.option_type());
        if let Some(part) = self.partial_display() {
            s.push(' ');
            s.push_str(&part);
        }
        s
    }

    fn mutate(&self, val: &str) -> Option<OptionWork>;
}

struct UCIButton {
    option_name: &'static str,
    mutator: fn() -> Option<OptionWork>,
}

impl UCIOption for UCIButton {
    fn option_type(&self) -> &'static str {
        "button"
    }
    fn option_name(&self) -> &'static str {
        self.option_name
    }
    fn partial_display(&self) -> Option<String> {
        None
    }
    fn mutate(&self, _val: &str) -> Option<OptionWork> {
        (self.mutator)()
    }
}

struct UCISpinImpl {
    option_name: &'static str,
    default: i32,
    min: i32,
    max: i32,
    mutator: fn(i32) -> Option<OptionWork>,
}

impl UCIOption for UCISpinImpl {
    fn option_type(&self) -> &'static str {
        "spin"
    }
    fn option_name(&self) -> &'static str {
        self.option_name
    }
    fn partial_display(&self) -> Option<String> {
        Some(format!("default {} min {} max {}", self.default, self.min, self.max))
    }
    fn mutate(&self, val: &str) -> Option<OptionWork> {
        let v: i32 = val.trim().parse().ok()?;
        if v < self.min || v > self.max {
            return None;
        }
        (self.mutator)(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_option_rejects_out_of_range_value() {
        let mut opts = OptionsMap::new();
        assert!(!opts.apply_option("Hash", "999999999"));
        assert!(opts.drain_work().next().is_none());
    }

    #[test]
    fn hash_option_accepts_in_range_value_and_queues_work() {
        let mut opts = OptionsMap::new();
        assert!(opts.apply_option("Hash", "64"));
        let work = opts.drain_work().next().expect("work queued");
        match work {
            OptionWork::ResizeTT(mb) => assert_eq!(mb, 64),
            _ => panic!("expected ResizeTT"),
        }
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut opts = OptionsMap::new();
        assert!(!opts.apply_option("NotARealOption", "1"));
    }
}
