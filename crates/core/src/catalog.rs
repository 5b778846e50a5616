//! Built-in curriculum reference data.
//!
//! The catalog is assembled once per process and shared read-only; nothing
//! mutates it after construction.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, LazyLock};

use thiserror::Error;

use crate::model::{
    BrandApplication, BundleStatus, CurriculumWeek, FrameworkStep, Idea, IdeaId, IdeaScore,
    Principle, RecommendationTier, TOTAL_WEEKS, Trend, TrendReport, VideoRef, WeekBundle,
    WeekError, WeekNumber, WeeklyAnalysis,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog must list exactly {expected} weeks, got {actual}")]
    WeekCount { expected: usize, actual: usize },

    #[error("week {0} is listed out of order")]
    OutOfOrder(WeekNumber),

    #[error("bundle for week {week} repeats idea id {id}")]
    DuplicateIdea { week: WeekNumber, id: IdeaId },

    #[error(transparent)]
    Week(#[from] WeekError),
}

/// Immutable curriculum: the ordered weeks, the published bundles for
/// analyzed weeks, and the lecture video mapping.
#[derive(Debug, Clone)]
pub struct CurriculumCatalog {
    weeks: Vec<CurriculumWeek>,
    bundles: BTreeMap<WeekNumber, WeekBundle>,
    videos: BTreeMap<WeekNumber, VideoRef>,
}

impl CurriculumCatalog {
    /// Assemble a catalog from its parts.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the weeks are not exactly 1..=23 in order
    /// or a bundle repeats an idea id.
    pub fn new(
        weeks: Vec<CurriculumWeek>,
        bundles: Vec<WeekBundle>,
        videos: Vec<(WeekNumber, VideoRef)>,
    ) -> Result<Self, CatalogError> {
        let expected = usize::from(TOTAL_WEEKS);
        if weeks.len() != expected {
            return Err(CatalogError::WeekCount {
                expected,
                actual: weeks.len(),
            });
        }
        for (week, expected) in weeks.iter().zip(WeekNumber::all()) {
            if week.week() != expected {
                return Err(CatalogError::OutOfOrder(week.week()));
            }
        }

        let mut by_week = BTreeMap::new();
        for bundle in bundles {
            let mut seen = HashSet::new();
            for idea in &bundle.ideas {
                if !seen.insert(idea.id) {
                    return Err(CatalogError::DuplicateIdea {
                        week: bundle.week,
                        id: idea.id,
                    });
                }
            }
            by_week.insert(bundle.week, bundle);
        }

        Ok(Self {
            weeks,
            bundles: by_week,
            videos: videos.into_iter().collect(),
        })
    }

    /// The process-wide built-in catalog, built on first use and shared.
    ///
    /// # Panics
    ///
    /// Panics if the built-in data is malformed, which the crate tests rule out.
    #[must_use]
    pub fn builtin() -> Arc<CurriculumCatalog> {
        static CATALOG: LazyLock<Arc<CurriculumCatalog>> = LazyLock::new(|| {
            Arc::new(build_builtin().expect("built-in catalog should be valid"))
        });
        Arc::clone(&CATALOG)
    }

    #[must_use]
    pub fn weeks(&self) -> &[CurriculumWeek] {
        &self.weeks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    #[must_use]
    pub fn week(&self, week: WeekNumber) -> Option<&CurriculumWeek> {
        self.weeks.get(usize::from(week.value()) - 1)
    }

    #[must_use]
    pub fn bundle(&self, week: WeekNumber) -> Option<&WeekBundle> {
        self.bundles.get(&week)
    }

    pub fn bundles(&self) -> impl Iterator<Item = &WeekBundle> {
        self.bundles.values()
    }

    #[must_use]
    pub fn video(&self, week: WeekNumber) -> Option<&VideoRef> {
        self.videos.get(&week)
    }

    /// Number of weeks whose bundle is marked completed.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.bundles.values().filter(|b| b.is_completed()).count()
    }

    /// Weeks that have a published bundle, in ascending order.
    pub fn analyzed_weeks(&self) -> impl Iterator<Item = WeekNumber> + '_ {
        self.bundles.keys().copied()
    }
}

//
// ─── BUILT-IN DATA ─────────────────────────────────────────────────────────────
//

const CHAPTERS: [(&str, &str); TOTAL_WEEKS as usize] = [
    (
        "Not Mass, Not Spam, Not Shameful",
        "Marketing is a generous act that makes change happen",
    ),
    ("The Marketer Learns to See", "Learning to see differently"),
    (
        "Marketing Changes People Through Stories",
        "Changing people through stories",
    ),
    ("The Smallest Viable Market", "Focus on the smallest viable market"),
    ("In Search of 'Better'", "In pursuit of better"),
    ("Beyond Commodities", "Moving past the commodity"),
    ("The Canvas of Dreams and Desires", "A canvas of dreams and desires"),
    ("More of the Who", "Understanding the audience more deeply"),
    (
        "People Like Us Do Things Like This",
        "People like us do things like this",
    ),
    ("Trust and Tension", "Trust and tension"),
    (
        "Status, Dominance, and Affiliation",
        "Status, dominance, and belonging",
    ),
    ("A Better Business Plan", "A better business plan"),
    (
        "Semiotics, Symbols, and Vernacular",
        "Signs, symbols, and language",
    ),
    (
        "Treat Different People Differently",
        "Treat different people differently",
    ),
    ("Reaching the Right People", "Reaching the right people"),
    ("Price Is a Story", "Price is a story"),
    (
        "Permission and Remarkability",
        "Permission and remarkability",
    ),
    (
        "Trust Is as Scarce as Attention",
        "Trust is as scarce as attention",
    ),
    ("The Funnel", "The funnel"),
    ("Organizing and Leading a Tribe", "Organizing and leading a tribe"),
    ("Some Case Studies", "Case studies"),
    ("Marketing Works", "Marketing works"),
    (
        "Marketing to the Most Important Person",
        "Marketing to the most important person",
    ),
];

const VIDEOS: [(u8, &str, &str); 18] = [
    (1, "B5Q2nwJEPkM", "The first principle of brand marketing that spreads fast"),
    (2, "jXmjoi0sjh0", "What top brand marketers see differently"),
    (3, "yZ9_wU_JCDc", "What a brand marketer actually does"),
    (4, "adBZDDOZliI", "How a brand really becomes a culture"),
    (5, "8Ea6plyPdgY", "What style-only brands never understand"),
    (6, "Tg0hacp_46k", "What style-only brands never understand, part 2"),
    (7, "FjUojt16DVA", "What you want to sell vs. what people want to buy"),
    (8, "R-UnodXzD8U", "The first brand goal after launch"),
    (9, "SIwA7Zl6wtU", "Brand marketing up to the first 1,000 fans"),
    (10, "ccyK76hYzSE", "Is brand marketing right for me?"),
    (11, "LORXO4SvhXU", "Where different ideas come from"),
    (12, "ixdGnE4FPLc", "Writing a better business plan"),
    (13, "RFRPXV7KLK8", "Competing as a brand, not a trademark"),
    (14, "QOySe-R7IVE", "The first principle of identity marketing"),
    (15, "SjJ4W5SMX88", "A master's take on 'just do it already'"),
    (16, "aRyjw2OO_Qc", "The law of irrational pricing"),
    (17, "h2SkRbUPQCw", "How quiet brands market well"),
    (18, "ohyrD-6XBFQ", "How small brands survive an age of aversion"),
];

fn build_builtin() -> Result<CurriculumCatalog, CatalogError> {
    let weeks = CHAPTERS
        .iter()
        .zip(WeekNumber::all())
        .map(|((title, subtitle), week)| CurriculumWeek::new(week, *title, *subtitle))
        .collect::<Result<Vec<_>, _>>()?;

    let videos = VIDEOS
        .iter()
        .map(|(week, id, title)| {
            Ok((
                WeekNumber::new(*week)?,
                VideoRef {
                    video_id: (*id).to_owned(),
                    chapter: *week,
                    title: (*title).to_owned(),
                },
            ))
        })
        .collect::<Result<Vec<_>, WeekError>>()?;

    CurriculumCatalog::new(weeks, vec![week_one()], videos)
}

fn principle(label: &str, description: &str) -> Principle {
    Principle {
        label: label.to_owned(),
        description: description.to_owned(),
    }
}

fn step(step: u8, title: &str, description: &str) -> FrameworkStep {
    FrameworkStep {
        step,
        title: title.to_owned(),
        description: description.to_owned(),
    }
}

fn trend(name: &str, description: &str) -> Trend {
    Trend {
        name: name.to_owned(),
        description: description.to_owned(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[allow(clippy::too_many_lines)]
fn week_one() -> WeekBundle {
    let analysis = WeeklyAnalysis {
        core_message: "Marketing is the act of making change happen.".to_owned(),
        principles: vec![
            principle(
                "Marketing is not advertising",
                "Not just selling things, but changing customers' lives for the better",
            ),
            principle(
                "A generous act",
                "Not deceiving people, but helping them solve their problems",
            ),
            principle(
                "Creating culture",
                "Belonging and identity: people like us do things like this",
            ),
        ],
        framework: [
            step(
                1,
                "Invent something worth making",
                "Discover the craving of women in their 20s and 30s obsessed with thick texture",
            ),
            step(
                2,
                "Design it for a few",
                "Focus on the SVM that wants refined self-care, not everyone",
            ),
            step(
                3,
                "Tell a story that matches the narrative",
                "'Your diet proves your taste'",
            ),
            step(
                4,
                "Spread the word",
                "A tense limited drop every Wednesday at 10 PM",
            ),
            step(
                5,
                "Show up consistently",
                "Earn trust with the same thick texture every week",
            ),
        ],
        brand_application: Some(BrandApplication {
            svm: "Women in their 20s and 30s who want to display the self that takes care of \
                  herself, plating even a single yogurt to have her refined taste confirmed."
                .to_owned(),
            change_story: "From a bland chicken-breast diet to a guilt-free nightly retreat \
                           that feels like a hotel dessert."
                .to_owned(),
            culture: "At 10 PM our people open the fridge. They do not resist the late-night \
                      snack; they enjoy it in the healthiest, most refined way."
                .to_owned(),
            xy_statement: "The brand helps women who want even diet management to be an \
                           elegant hobby (X) have a sweet night without guilt (Y)."
                .to_owned(),
        }),
    };

    let trends = TrendReport {
        market_size: "KRW 111.6B (2025, doubled in two years)".to_owned(),
        market_share: "23.6% of spoonable yogurt".to_owned(),
        key_trends: vec![
            trend("Aesthetic Health", "Health to be shown; pretty plating is a must"),
            trend("Hobbyist Diet", "Diet management as a hobby rather than a burden"),
            trend(
                "Tipping point: Wednesday",
                "Mid-week fatigue peaks and the reward instinct kicks in",
            ),
            trend("Night routine", "Time to care for yourself before sleep"),
            trend("Aesthetics of thickness", "Texture itself signals premium"),
            trend(
                "Guilt-Free Pleasure",
                "Delicious but not fattening, a paradox people pursue",
            ),
        ],
        threats: strings(&[
            "Cheap bulk homemade yogurt trend",
            "Convenience store private labels catching up in quality",
            "Recession spending that values price over presentation",
        ]),
    };

    WeekBundle {
        week: WeekNumber::FIRST,
        chapter: "Chapter 1: Not Mass, Not Spam, Not Shameful".to_owned(),
        status: BundleStatus::Active,
        analysis,
        trends,
        ideas: week_one_ideas(),
    }
}

#[allow(clippy::too_many_lines)]
fn week_one_ideas() -> Vec<Idea> {
    vec![
        Idea {
            id: IdeaId::new(1),
            title: "'Wednesday 10PM' wish time (mid-week reset)".to_owned(),
            description: "Wednesday 10 PM, when weekend regret and mid-week fatigue overlap. \
                          Open a two-hour time deal with 'reset your broken diet now', framing \
                          the purchase as a ritual that books tomorrow's clean self."
                .to_owned(),
            category: "Promotion".to_owned(),
            category_emoji: "🌙".to_owned(),
            recommendation: RecommendationTier::ExecuteNow,
            chapter_principle: "Create tension and offer a chance to act.".to_owned(),
            smallest_viable_action: "Wednesday 10 PM messenger push plus a time-deal banner \
                                     on the store"
                .to_owned(),
            success_metric: "Wednesday 22-24h revenue up 150% week over week".to_owned(),
            risks: strings(&[
                "Store outage under a traffic spike",
                "Growing dependence on discounts",
            ]),
            score: IdeaScore {
                impact: 5,
                fit: 5,
                speed: 5,
                effort: 2,
                cost: 2,
                total: 13,
            },
        },
        Idea {
            id: IdeaId::new(2),
            title: "'Guilt-Free Night' content series".to_owned(),
            description: "Don't hold back on late-night snacks, wish instead. A reels series of \
                          fat-free thick late-night recipes that won't leave you puffy the next \
                          morning."
                .to_owned(),
            category: "Content".to_owned(),
            category_emoji: "✨".to_owned(),
            recommendation: RecommendationTier::Priority,
            chapter_principle: "Offer people a better alternative.".to_owned(),
            smallest_viable_action: "Produce and upload three moody night-time recipe reels"
                .to_owned(),
            success_metric: "200+ saves/shares, more inflow on the 'late-night snack' keyword"
                .to_owned(),
            risks: strings(&[
                "Contradiction when using high-calorie toppings",
                "Criticism for encouraging late-night eating",
            ]),
            score: IdeaScore {
                impact: 4,
                fit: 5,
                speed: 4,
                effort: 3,
                cost: 1,
                total: 12,
            },
        },
        Idea {
            id: IdeaId::new(3),
            title: "Aesthetic plating challenge".to_owned(),
            description: "A challenge to share the prettiest way to eat it, staged as an object \
                          on the table. Winners get featured and named curator of the month."
                .to_owned(),
            category: "Viral".to_owned(),
            category_emoji: "📸".to_owned(),
            recommendation: RecommendationTier::Priority,
            chapter_principle: "Build a tribe culture: people like us do things like this."
                .to_owned(),
            smallest_viable_action: "Announce the challenge with five reference images"
                .to_owned(),
            success_metric: "50+ pieces of user-generated content".to_owned(),
            risks: strings(&[
                "Low participation (entry barrier)",
                "Existing fitness-focused customers feel out of place",
            ]),
            score: IdeaScore {
                impact: 5,
                fit: 5,
                speed: 3,
                effort: 2,
                cost: 1,
                total: 12,
            },
        },
        Idea {
            id: IdeaId::new(4),
            title: "Office 3PM: recharge with a wish, not sugar".to_owned(),
            description: "3 PM slump at the office. Instead of pantry snacks, one bowl on the \
                          desk, positioned as the snack of women who work well."
                .to_owned(),
            category: "Targeting".to_owned(),
            category_emoji: "🏢".to_owned(),
            recommendation: RecommendationTier::Deferred,
            chapter_principle: "Tell a story that fits the audience's worldview.".to_owned(),
            smallest_viable_action: "Run relatable office-themed image ads for the target"
                .to_owned(),
            success_metric: "Reach a 2% click-through rate".to_owned(),
            risks: strings(&[
                "Needs refrigeration (office fridge wars)",
                "Convenience of eating at a desk",
            ]),
            score: IdeaScore {
                impact: 4,
                fit: 4,
                speed: 4,
                effort: 3,
                cost: 3,
                total: 11,
            },
        },
        Idea {
            id: IdeaId::new(5),
            title: "One week, one tub subscription pledge".to_owned(),
            description: "A promise that fills your fridge every Monday. Launch a weekly \
                          auto-pay subscription with subscriber-only recipe cards and a wooden \
                          spoon."
                .to_owned(),
            category: "Conversion".to_owned(),
            category_emoji: "📦".to_owned(),
            recommendation: RecommendationTier::LongTerm,
            chapter_principle: "Trust is scarce; build it by keeping promises consistently."
                .to_owned(),
            smallest_viable_action: "List a subscription product and rework the detail page \
                                     around the one-tub-a-week routine"
                .to_owned(),
            success_metric: "5% subscription conversion".to_owned(),
            risks: strings(&[
                "Logistics and shipping costs",
                "Price burden of weekly consumption",
            ]),
            score: IdeaScore {
                impact: 5,
                fit: 5,
                speed: 2,
                effort: 4,
                cost: 2,
                total: 10,
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(n: u8) -> WeekNumber {
        WeekNumber::new(n).unwrap()
    }

    #[test]
    fn builtin_has_twenty_three_ordered_weeks() {
        let catalog = CurriculumCatalog::builtin();
        assert_eq!(catalog.len(), 23);
        for (index, w) in catalog.weeks().iter().enumerate() {
            assert_eq!(usize::from(w.week().value()), index + 1);
        }
        assert_eq!(catalog.week(week(16)).unwrap().title(), "Price Is a Story");
    }

    #[test]
    fn builtin_is_shared_not_copied() {
        let a = CurriculumCatalog::builtin();
        let b = CurriculumCatalog::builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn builtin_publishes_only_week_one() {
        let catalog = CurriculumCatalog::builtin();
        let analyzed: Vec<_> = catalog.analyzed_weeks().collect();
        assert_eq!(analyzed, vec![WeekNumber::FIRST]);
        assert!(catalog.bundle(week(2)).is_none());
    }

    #[test]
    fn week_one_bundle_shape() {
        let catalog = CurriculumCatalog::builtin();
        let bundle = catalog.bundle(WeekNumber::FIRST).unwrap();
        assert_eq!(bundle.status, BundleStatus::Active);
        assert_eq!(bundle.analysis.principles.len(), 3);
        assert!(bundle.analysis.framework_is_sequential());
        assert!(bundle.analysis.brand_application.is_some());
        let totals: Vec<i32> = bundle.ideas.iter().map(|i| i.score.total).collect();
        assert_eq!(totals, vec![13, 12, 12, 11, 10]);
    }

    #[test]
    fn published_totals_do_not_follow_component_arithmetic() {
        // Known data quirk: totals are reproduced as published, not recomputed.
        let catalog = CurriculumCatalog::builtin();
        let bundle = catalog.bundle(WeekNumber::FIRST).unwrap();
        let mismatched = bundle
            .ideas
            .iter()
            .filter(|i| !i.score.total_matches_components())
            .count();
        assert!(mismatched > 0);
        assert_eq!(bundle.ideas[0].score.component_balance(), 11);
        assert_eq!(bundle.ideas[0].score.total, 13);
    }

    #[test]
    fn active_bundle_does_not_count_as_completed() {
        assert_eq!(CurriculumCatalog::builtin().completed_count(), 0);
    }

    #[test]
    fn videos_cover_first_eighteen_weeks() {
        let catalog = CurriculumCatalog::builtin();
        assert_eq!(catalog.video(week(1)).unwrap().video_id, "B5Q2nwJEPkM");
        assert_eq!(catalog.video(week(18)).unwrap().chapter, 18);
        assert!(catalog.video(week(19)).is_none());
    }

    #[test]
    fn new_rejects_short_week_list() {
        let weeks = vec![CurriculumWeek::new(WeekNumber::FIRST, "One", "").unwrap()];
        let err = CurriculumCatalog::new(weeks, Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(
            err,
            CatalogError::WeekCount {
                expected: 23,
                actual: 1
            }
        );
    }

    #[test]
    fn new_rejects_out_of_order_weeks() {
        let mut weeks: Vec<_> = CurriculumCatalog::builtin().weeks().to_vec();
        weeks.swap(3, 4);
        let err = CurriculumCatalog::new(weeks, Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err, CatalogError::OutOfOrder(week(5)));
    }

    #[test]
    fn new_rejects_duplicate_idea_ids() {
        let weeks = CurriculumCatalog::builtin().weeks().to_vec();
        let mut bundle = week_one();
        let first = bundle.ideas[0].clone();
        bundle.ideas.push(first);
        let err = CurriculumCatalog::new(weeks, vec![bundle], Vec::new()).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateIdea {
                week: WeekNumber::FIRST,
                id: IdeaId::new(1)
            }
        );
    }
}
