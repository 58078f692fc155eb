use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::types::{Intent, RiskTier};

/// Placeholder substituted with the caller-resolved display name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Named groups of interchangeable reply templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateGroup {
    Greeting,
    PainHigh,
    PainLow,
    Sadness,
    Anxiety,
    Joy,
    Gratitude,
    Listening,
}

/// Every reply the agent can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateBank {
    /// Crisis escalation, parameterized with `{name}`.
    pub crisis: String,
    pub high_priority: String,
    /// Short prompt used when nothing else applies.
    pub ask_more: String,
    pub greeting: Vec<String>,
    pub pain_high: Vec<String>,
    pub pain_low: Vec<String>,
    pub sadness: Vec<String>,
    pub anxiety: Vec<String>,
    pub joy: Vec<String>,
    pub gratitude: Vec<String>,
    pub listening: Vec<String>,
}

impl TemplateBank {
    pub fn group(&self, group: TemplateGroup) -> &[String] {
        match group {
            TemplateGroup::Greeting => &self.greeting,
            TemplateGroup::PainHigh => &self.pain_high,
            TemplateGroup::PainLow => &self.pain_low,
            TemplateGroup::Sadness => &self.sadness,
            TemplateGroup::Anxiety => &self.anxiety,
            TemplateGroup::Joy => &self.joy,
            TemplateGroup::Gratitude => &self.gratitude,
            TemplateGroup::Listening => &self.listening,
        }
    }

    pub fn builtin() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            crisis: "{name}, escucho mucho dolor en tus palabras y me preocupas. Tu vida es valiosa. \
                     Por favor, déjame contactar a ayuda profesional ahora mismo. No estás sola."
                .into(),
            high_priority: "Siento que estás al límite. Es importante no cargar esto sola. \
                            Voy a notificar a tu médico para que revisen tu caso prioritariamente. \
                            Respira conmigo un momento."
                .into(),
            ask_more: "Te escucho. ¿Podrías contarme un poco más?".into(),
            greeting: owned(&[
                "¡Hola {name}! 🌸 Qué alegría verte de nuevo. ¿Cómo te sientes en este momento?",
                "Hola {name}, aquí estoy para ti. ¿Cómo ha ido tu día hasta ahora?",
                "Bienvenida de nuevo, {name}. Soy Lia. ¿En qué puedo acompañarte hoy?",
                "Hola {name}. Espero que estés teniendo un día tranquilo. Cuéntame, ¿cómo estás?",
            ]),
            pain_high: owned(&[
                "Siento mucho que estés pasando por ese dolor tan fuerte. Es importante que no lo ignores. ¿Has tomado tu medicación habitual?",
                "Entiendo que el dolor es intenso. Por favor, trata de respirar profundo. ¿Podrías describir exactamente dónde se localiza?",
                "Lamento escuchar eso. Nadie debería sentir dolor así. ¿Del 1 al 10, dirías que es un 8 o más?",
            ]),
            pain_low: owned(&[
                "Entiendo, el dolor o molestia siempre es incómodo. ¿Crees que el descanso te ayudaría?",
                "Lamento que tengas esa molestia. ¿Has notado si empeora con algún movimiento?",
                "Tomo nota de tu malestar. A veces el cuerpo nos pide pausa. ¿Puedes descansar un poco ahora?",
            ]),
            sadness: owned(&[
                "Te abrazo a la distancia. Es completamente válido sentirse triste. ¿Quieres contarme qué provocó este sentimiento?",
                "Está bien no estar bien a veces. Aquí estoy para escucharte sin juzgar. Desahógate si lo necesitas.",
                "La tristeza es una emoción pesada, pero no tienes que cargarla sola. Estoy aquí contigo.",
                "Tómate tu tiempo. Llorar o sentirse bajo de energía es parte de ser humano. ¿Puedo hacer algo para apoyarte?",
            ]),
            anxiety: owned(&[
                "Respira conmigo... Inhala despacio... Exhala. La ansiedad puede ser abrumadora, pero pasará. ¿Qué te preocupa en este instante?",
                "Siento que estás inquieta. Tratemos de enfocarnos en el presente. ¿Puedes nombrar 3 cosas que ves a tu alrededor?",
                "La ansiedad a veces nos miente sobre el futuro. Vamos paso a paso. Estoy aquí contigo, segura.",
            ]),
            joy: owned(&[
                "¡Qué maravilla leer eso! 🎉 Me encanta saber que te sientes bien.",
                "¡Eso suena fantástico! Es importante celebrar estos momentos de bienestar.",
                "¡Me alegra muchísimo! Gracias por compartir algo positivo conmigo, ilumina mi día virtual.",
            ]),
            gratitude: owned(&[
                "No tienes nada que agradecer, es mi propósito acompañarte. 💜",
                "¡Para eso estoy! Me hace feliz poder ser útil.",
                "Gracias a ti por confiar en mí y abrirte.",
            ]),
            listening: owned(&[
                "Te escucho atentamente. Cuéntame un poco más para entender mejor.",
                "Entiendo. ¿Y cómo te hace sentir eso?",
                "Vaya... continua, por favor. Estoy aquí para leerte.",
                "Mm, entiendo. ¿Hay algo específico en lo que te gustaría que profundicemos?",
                "A veces es difícil ponerlo en palabras, pero lo estás haciendo muy bien. Cuéntame más.",
            ]),
        }
    }
}

impl Default for TemplateBank {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Words that route a message to the pain replies and gauge its intensity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PainCues {
    /// Literal pain word; its presence selects pain replies even when the
    /// intent is something else.
    pub keyword: String,
    pub intensity_markers: Vec<String>,
}

impl PainCues {
    pub fn builtin() -> Self {
        Self {
            keyword: "dolor".into(),
            intensity_markers: ["mucho", "insoportable", "horrible", "fuerte", "8", "9", "10"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn mentions_pain(&self, message: &str) -> bool {
        !self.keyword.is_empty() && message.contains(self.keyword.as_str())
    }

    pub fn is_high_intensity(&self, message: &str) -> bool {
        self.intensity_markers
            .iter()
            .any(|marker| message.contains(marker.as_str()))
    }
}

impl Default for PainCues {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Inputs to reply selection. `message` must already be normalized.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub intent: Intent,
    pub risk_tier: RiskTier,
    pub display_name: &'a str,
    pub message: &'a str,
}

/// What a matching rule asks the generator to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseChoice {
    Crisis,
    HighPriority,
    Group(TemplateGroup),
    AskMore,
}

/// Reply selection rules. Evaluated in `RESPONSE_RULES` order; the first
/// rule that applies decides the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseRule {
    Crisis,
    HighPriority,
    Pain,
    Sadness,
    Anxiety,
    Greeting,
    Gratitude,
    Joy,
    Listening,
}

pub const RESPONSE_RULES: &[ResponseRule] = &[
    ResponseRule::Crisis,
    ResponseRule::HighPriority,
    ResponseRule::Pain,
    ResponseRule::Sadness,
    ResponseRule::Anxiety,
    ResponseRule::Greeting,
    ResponseRule::Gratitude,
    ResponseRule::Joy,
    ResponseRule::Listening,
];

/// Minimum message length (in characters) for the listening replies.
const LISTENING_MIN_CHARS: usize = 10;

impl ResponseRule {
    pub fn evaluate(&self, ctx: &ResponseContext<'_>, cues: &PainCues) -> Option<ResponseChoice> {
        let group_if = |cond: bool, group| cond.then_some(ResponseChoice::Group(group));
        match self {
            Self::Crisis => (ctx.risk_tier == RiskTier::Critical).then_some(ResponseChoice::Crisis),
            Self::HighPriority => {
                (ctx.risk_tier == RiskTier::High).then_some(ResponseChoice::HighPriority)
            }
            Self::Pain => {
                if ctx.intent != Intent::Pain && !cues.mentions_pain(ctx.message) {
                    return None;
                }
                if cues.is_high_intensity(ctx.message) {
                    Some(ResponseChoice::Group(TemplateGroup::PainHigh))
                } else {
                    Some(ResponseChoice::Group(TemplateGroup::PainLow))
                }
            }
            Self::Sadness => group_if(ctx.intent == Intent::Sadness, TemplateGroup::Sadness),
            Self::Anxiety => group_if(ctx.intent == Intent::Anxiety, TemplateGroup::Anxiety),
            Self::Greeting => group_if(ctx.intent == Intent::Greeting, TemplateGroup::Greeting),
            Self::Gratitude => group_if(ctx.intent == Intent::Gratitude, TemplateGroup::Gratitude),
            Self::Joy => group_if(ctx.intent == Intent::Joy, TemplateGroup::Joy),
            Self::Listening => group_if(
                ctx.message.chars().count() > LISTENING_MIN_CHARS && !ctx.message.contains('?'),
                TemplateGroup::Listening,
            ),
        }
    }
}

/// Picks and renders the agent's reply.
#[derive(Debug, Clone, Default)]
pub struct ResponseGenerator {
    bank: TemplateBank,
    cues: PainCues,
}

impl ResponseGenerator {
    pub fn new(bank: TemplateBank, cues: PainCues) -> Self {
        Self { bank, cues }
    }

    pub fn bank(&self) -> &TemplateBank {
        &self.bank
    }

    pub fn cues(&self) -> &PainCues {
        &self.cues
    }

    pub fn choose(&self, ctx: &ResponseContext<'_>) -> ResponseChoice {
        RESPONSE_RULES
            .iter()
            .find_map(|rule| rule.evaluate(ctx, &self.cues))
            .unwrap_or(ResponseChoice::AskMore)
    }

    pub fn generate<R: Rng + ?Sized>(&self, ctx: &ResponseContext<'_>, rng: &mut R) -> String {
        match self.choose(ctx) {
            ResponseChoice::Crisis => self.bank.crisis.replace(NAME_PLACEHOLDER, ctx.display_name),
            ResponseChoice::HighPriority => self.bank.high_priority.clone(),
            ResponseChoice::AskMore => self.bank.ask_more.clone(),
            ResponseChoice::Group(group) => match self.bank.group(group).choose(rng) {
                Some(template) => template.replace(NAME_PLACEHOLDER, ctx.display_name),
                None => {
                    tracing::warn!(?group, "Template group is empty, using ask-more prompt");
                    self.bank.ask_more.clone()
                }
            },
        }
    }
}
