use crate::db::DatabaseError;
use crate::triage::RiskTier;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + label + std::str::FromStr pattern.
/// `as_str` is the stored value, `label` the Spanish display text.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => ($s:literal, $label:literal)),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => ("PATIENT", "Paciente"),
    Doctor => ("DOCTOR", "Médico"),
    Psychologist => ("PSYCHOLOGIST", "Psicólogo/a"),
});

str_enum!(SymptomType {
    Pain => ("PAIN", "Dolor"),
    Fatigue => ("FATIGUE", "Fatiga"),
    Nausea => ("NAUSEA", "Náusea"),
    Vomiting => ("VOMITING", "Vómito"),
    Fever => ("FEVER", "Fiebre"),
    Insomnia => ("INSOMNIA", "Insomnio"),
    AppetiteLoss => ("APPETITE_LOSS", "Pérdida de apetito"),
    Other => ("OTHER", "Otro"),
});

str_enum!(ReportedVia {
    Chat => ("CHAT", "Chat con Lia"),
    Form => ("FORM", "Formulario"),
    Voice => ("VOICE", "Memo de voz"),
});

str_enum!(AlertType {
    SymptomSevere => ("SYMPTOM_SEVERE", "Síntoma Severo"),
    EmotionCrisis => ("EMOTION_CRISIS", "Crisis Emocional"),
    MissedCheckin => ("MISSED_CHECKIN", "Check-in Perdido"),
    ChatRisk => ("CHAT_RISK", "Riesgo Detectado en Chat"),
    Manual => ("MANUAL", "Manual"),
});

str_enum!(AlertSeverity {
    Low => ("LOW", "Baja"),
    Medium => ("MEDIUM", "Media"),
    High => ("HIGH", "Alta"),
    Critical => ("CRITICAL", "Crítica"),
});

str_enum!(TimelineEventType {
    Diagnosis => ("DIAGNOSIS", "Diagnóstico"),
    Treatment => ("TREATMENT", "Tratamiento"),
    Surgery => ("SURGERY", "Cirugía"),
    Symptom => ("SYMPTOM", "Síntoma"),
    Appointment => ("APPOINTMENT", "Cita Médica"),
    LabResult => ("LAB_RESULT", "Resultado de Laboratorio"),
    Other => ("OTHER", "Otro"),
});

str_enum!(CheckInType {
    Daily => ("DAILY", "Diario"),
    Weekly => ("WEEKLY", "Semanal"),
});

str_enum!(RecommendationCategory {
    Exercise => ("EXERCISE", "Ejercicio"),
    Meditation => ("MEDITATION", "Meditación"),
    Social => ("SOCIAL", "Actividad Social"),
    Reading => ("READING", "Lectura"),
    Hobby => ("HOBBY", "Hobby"),
    Nutrition => ("NUTRITION", "Nutrición"),
    Sleep => ("SLEEP", "Sueño"),
    Other => ("OTHER", "Otro"),
});

impl AlertSeverity {
    /// Severity of an alert raised for a chat risk tier. NONE raises nothing.
    pub fn from_risk(tier: RiskTier) -> Option<Self> {
        match tier {
            RiskTier::None => None,
            RiskTier::Low => Some(Self::Low),
            RiskTier::Medium => Some(Self::Medium),
            RiskTier::High => Some(Self::High),
            RiskTier::Critical => Some(Self::Critical),
        }
    }

    /// Sort key, higher is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }
}
