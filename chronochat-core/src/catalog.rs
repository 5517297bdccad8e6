//! Scenario catalog: the static reference data every session draws from.
//!
//! Eras, roles, AI personas, and mock participants are read-only for the
//! process lifetime. The built-in set lives in [`struct@ERAS`]; sessions
//! normally work through a [`Catalog`] so tests can substitute their own
//! scenario data.

use serde::{Deserialize, Serialize};

/// Sentinel counterpart id for the synthesized general era guide.
///
/// This target is offered for every era in `learn` and `dm` modes,
/// whether or not the era defines authored personas.
pub const GENERAL_ERA_AI: &str = "general_era_ai";

/// A selectable historical or fictional scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Era {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Narrative context embedded into every instruction for this era.
    pub context: String,
    /// Visual subject for snapshot prompts. Falls back to `description`.
    pub image_subject: Option<String>,
    pub roles: Vec<Role>,
    pub personas: Vec<AiPersona>,
    pub mocks: Vec<MockParticipant>,
}

impl Era {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            context: context.into(),
            image_subject: None,
            roles: Vec::new(),
            personas: Vec::new(),
            mocks: Vec::new(),
        }
    }

    pub fn with_image_subject(mut self, subject: impl Into<String>) -> Self {
        self.image_subject = Some(subject.into());
        self
    }

    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_personas(mut self, personas: Vec<AiPersona>) -> Self {
        self.personas = personas;
        self
    }

    pub fn with_mocks(mut self, mocks: Vec<MockParticipant>) -> Self {
        self.mocks = mocks;
        self
    }

    /// Look up a role by id within this era.
    pub fn role(&self, id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// Look up an authored persona by id within this era.
    pub fn persona(&self, id: &str) -> Option<&AiPersona> {
        self.personas.iter().find(|p| p.id == id)
    }

    /// Look up a mock participant by id within this era.
    pub fn mock(&self, id: &str) -> Option<&MockParticipant> {
        self.mocks.iter().find(|m| m.id == id)
    }

    /// The subject string used when composing snapshot prompts.
    pub fn visual_subject(&self) -> &str {
        self.image_subject.as_deref().unwrap_or(&self.description)
    }
}

/// A persona the human user adopts within an era.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Role {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// An authored, named conversational character scripted for an era.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiPersona {
    pub id: String,
    pub name: String,
    /// Prompt fragment defining the character's voice and knowledge.
    pub instruction: String,
    pub welcome: String,
}

impl AiPersona {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        instruction: impl Into<String>,
        welcome: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instruction: instruction.into(),
            welcome: welcome.into(),
        }
    }
}

/// A scripted in-era character, presented as already "real" in the scenario.
///
/// Mocks occupy one of the era's roles. A mock without a canned welcome gets
/// one generated on first contact, which is then fixed for the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockParticipant {
    pub id: String,
    pub name: String,
    pub role_id: String,
    pub welcome: Option<String>,
}

impl MockParticipant {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role_id: role_id.into(),
            welcome: None,
        }
    }

    pub fn with_welcome(mut self, welcome: impl Into<String>) -> Self {
        self.welcome = Some(welcome.into());
        self
    }
}

/// The set of eras a session can travel to.
#[derive(Debug, Clone)]
pub struct Catalog {
    eras: Vec<Era>,
}

impl Catalog {
    /// Create a catalog from explicit era data.
    pub fn new(eras: Vec<Era>) -> Self {
        Self { eras }
    }

    /// The built-in catalog.
    pub fn builtin() -> Self {
        Self { eras: ERAS.clone() }
    }

    pub fn eras(&self) -> &[Era] {
        &self.eras
    }

    /// Look up an era by id.
    pub fn era(&self, id: &str) -> Option<&Era> {
        self.eras.iter().find(|e| e.id == id)
    }
}

// ============================================================================
// Built-in eras
// ============================================================================

lazy_static::lazy_static! {
    /// The five built-in eras.
    pub static ref ERAS: Vec<Era> = vec![
        Era::new(
            "ancient-egypt",
            "Ancient Egypt (1350 BCE)",
            "Explore the land of Pharaohs and Pyramids during the reign of Akhenaten.",
            "You are in Ancient Egypt, around 1350 BCE, during the Amarna period. \
             Akhenaten's monotheistic worship of Aten is prominent. The capital city is Akhetaten.",
        )
        .with_image_subject(
            "the majestic temples and sun-baked sands of Akhetaten in Ancient Egypt, 1350 BCE",
        )
        .with_roles(vec![
            Role::new("royal-scribe", "Royal Scribe", "Records events and manages temple documents."),
            Role::new("artisan-baker", "Artisan Baker", "Prepares bread and goods for the city."),
            Role::new("aten-devotee", "Aten Devotee", "A common citizen embracing the new faith."),
        ])
        .with_personas(vec![
            AiPersona::new(
                "high-priestess-meritaten",
                "High Priestess Meritaten",
                "You are Meritaten, a High Priestess of Aten in Akhetaten, 1350 BCE. You are a \
                 devout follower of Akhenaten's reforms. Speak with wisdom, spirituality, and a \
                 deep understanding of Aten worship, Egyptian rituals, and daily life in the \
                 royal city. You are talking to a curious visitor who seems to have appeared \
                 from nowhere. Be cautious but willing to share insights about your faith and \
                 your time.",
                "Blessings of Aten upon you, traveler. I am Meritaten, High Priestess in service \
                 to the One True God. You seem... unfamiliar. What brings you to Akhetaten, the \
                 city of the Sun Disc's light?",
            ),
        ])
        .with_mocks(vec![
            MockParticipant::new("bek-baker", "Bek", "artisan-baker").with_welcome(
                "Greetings! The aroma of fresh bread welcomes you. I am Bek. What brings you to \
                 my humble bakery?",
            ),
            MockParticipant::new("nefer-devotee", "Nefer", "aten-devotee").with_welcome(
                "Praise Aten! It is good to see a new face in Akhetaten. I am Nefer.",
            ),
        ]),

        Era::new(
            "renaissance-europe",
            "Renaissance Europe (Florence, 1505 CE)",
            "Witness the rebirth of art and science in Florence, Italy.",
            "You are in Florence, Italy, around 1505 CE. Leonardo da Vinci is working on the \
             Mona Lisa, and Michelangelo has recently completed his David statue. The city is a \
             hub of artistic and intellectual activity.",
        )
        .with_image_subject(
            "a bustling Florentine street or an artist's workshop during the Renaissance in 1505 CE",
        )
        .with_roles(vec![
            Role::new("apprentice-artist", "Apprentice Artist", "Learning from a master in a bustling workshop."),
            Role::new("merchant-patron", "Merchant Patron", "Wealthy trader seeking to commission great art."),
            Role::new("scholar-humanist", "Scholar Humanist", "Discussing philosophy and classical texts."),
        ])
        .with_personas(vec![
            AiPersona::new(
                "leonardo-da-vinci",
                "Leonardo da Vinci",
                "You are Leonardo da Vinci, the Renaissance polymath, in Florence around 1505. \
                 Speak with boundless curiosity, intellectual depth, and an artistic flair. You \
                 are knowledgeable about art, anatomy, engineering, and philosophy of your time. \
                 You are currently pondering your latest inventions and artistic commissions, \
                 like the Mona Lisa. Respond to the user as if they are an inquisitive visitor \
                 to your workshop or a fellow thinker of the period. Be observant and perhaps a \
                 little enigmatic.",
                "Ah, a new face in Firenze! Buon giorno. I am Leonardo. You find me amidst my \
                 studies and creations. What curiosities or inquiries bring you to my attention \
                 today?",
            ),
        ])
        .with_mocks(vec![
            MockParticipant::new("giovanni-apprentice", "Giovanni", "apprentice-artist").with_welcome(
                "Welcome to the workshop! I'm Giovanni, learning from the Maestro. Are you here \
                 to see his latest work?",
            ),
            MockParticipant::new("isabella-patron", "Isabella", "merchant-patron").with_welcome(
                "Salutations. I am Isabella. Florence is alive with genius, wouldn't you agree? \
                 Perhaps you have an eye for fine art?",
            ),
        ]),

        Era::new(
            "moon-landing-1969",
            "Moon Landing (July 20, 1969)",
            "Experience the historic Apollo 11 Moon Landing.",
            "It's July 20, 1969. You are witnessing the Apollo 11 mission. Neil Armstrong and \
             Buzz Aldrin are about to walk on the Moon. The world is watching.",
        )
        .with_image_subject(
            "the Apollo 11 lunar module on the surface of the Moon, July 20, 1969, with Earth in the sky",
        )
        .with_roles(vec![
            Role::new("mission-control", "Mission Control Staffer", "Monitoring data at NASA during the landing."),
            Role::new("news-reporter", "News Reporter", "Covering the historic event for global news."),
            Role::new("family-viewer", "Family Member Watching", "Experiencing the landing from home on TV."),
        ])
        .with_mocks(vec![
            MockParticipant::new("walter-reporter", "Walter", "news-reporter").with_welcome(
                "What a day! History in the making. Are you as thrilled as I am about this \
                 giant leap?",
            ),
        ]),

        Era::new(
            "cyberpunk-2077",
            "Cyberpunk Neo-City (2077 CE)",
            "Navigate the neon-lit streets of a technologically advanced, dystopian future.",
            "You are in Neo-Kyoto, a sprawling cyberpunk metropolis in the year 2077. \
             Megacorporations wield immense power, cybernetic enhancements are common, and the \
             digital world bleeds into reality.",
        )
        .with_image_subject(
            "a neon-drenched, rain-slicked street in the cyberpunk metropolis of Neo-Kyoto in \
             2077, with towering skyscrapers and holographic advertisements",
        )
        .with_roles(vec![
            Role::new("street-samurai", "Street Samurai", "A freelance operative navigating the dangerous streets."),
            Role::new("corp-agent", "Corporate Agent", "Working for a megacorp, playing the power games."),
            Role::new("info-broker", "Info Broker", "Dealing in secrets and data in the digital depths."),
        ])
        .with_mocks(vec![
            MockParticipant::new("rogue-samurai", "Rogue", "street-samurai").with_welcome(
                "Need something done in Neo-Kyoto? Or just admiring the chrome? Name's Rogue.",
            ),
            MockParticipant::new("zero-broker", "Zero", "info-broker").with_welcome(
                "Data streams are flowing... What secrets do you seek in this city of shadows, \
                 choom?",
            ),
        ]),

        Era::new(
            "climate-summit-2050",
            "Global Climate Summit (2050 CE)",
            "Participate in critical discussions about Earth's future at a global summit.",
            "The year is 2050. You are attending a critical Global Climate Summit in a \
             technologically advanced, eco-conscious city. World leaders and scientists are \
             debating urgent solutions to climate change.",
        )
        .with_image_subject(
            "a futuristic, sustainable city hosting the Global Climate Summit in 2050, with \
             innovative green technologies visible",
        )
        .with_roles(vec![
            Role::new("lead-scientist", "Lead Climate Scientist", "Presenting research and solutions."),
            Role::new("diplomat-negotiator", "Diplomat & Negotiator", "Working towards international agreements."),
            Role::new("youth-activist", "Youth Climate Activist", "Advocating for future generations."),
        ])
        .with_mocks(vec![
            MockParticipant::new("dr-aris-scientist", "Dr. Aris", "lead-scientist").with_welcome(
                "Welcome to the Summit. The data is clear, and the time for action is now. What \
                 are your thoughts on our planet's future?",
            ),
            MockParticipant::new("lena-activist", "Lena", "youth-activist").with_welcome(
                "Our future is on the line. It's good to see more people engaged. Are you here \
                 to help make a difference?",
            ),
        ]),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_shape() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.eras().len(), 5);

        for era in catalog.eras() {
            assert_eq!(era.roles.len(), 3, "era {} should have 3 roles", era.id);
            for mock in &era.mocks {
                assert!(
                    era.role(&mock.role_id).is_some(),
                    "mock {} references unknown role {}",
                    mock.id,
                    mock.role_id
                );
            }
        }
    }

    #[test]
    fn test_era_lookups() {
        let catalog = Catalog::builtin();
        let egypt = catalog.era("ancient-egypt").unwrap();

        assert!(egypt.role("royal-scribe").is_some());
        assert!(egypt.role("street-samurai").is_none());
        assert!(egypt.persona("high-priestess-meritaten").is_some());
        assert!(egypt.mock("bek-baker").is_some());
        assert!(catalog.era("atlantis").is_none());
    }

    #[test]
    fn test_visual_subject_fallback() {
        let era = Era::new("test", "Test Era", "A test description.", "Context.");
        assert_eq!(era.visual_subject(), "A test description.");

        let era = era.with_image_subject("a painted test scene");
        assert_eq!(era.visual_subject(), "a painted test scene");
    }

    #[test]
    fn test_moon_landing_has_no_personas() {
        let catalog = Catalog::builtin();
        let moon = catalog.era("moon-landing-1969").unwrap();
        assert!(moon.personas.is_empty());
        assert_eq!(moon.mocks.len(), 1);
    }
}
