//! Prompt composition for fairing renders.
//!
//! The final prompt is the system prefix, a block of motorcycle details (each
//! falling back to a fixed phrase when the customer left it out), the free-text
//! description and a closing set of rendering requirements. User text is
//! interpolated verbatim.

use crate::models::RenderRequest;

/// Instructions placed ahead of every customer request.
pub const SYSTEM_PREFIX: &str = r#"You are a professional motorcycle visualization engine specializing in premium, photorealistic studio renders for sportbikes, superbikes, and aftermarket fairing kits.

You must automatically determine the correct output based on user intent:

-------------------------------------------
INTENT MODES
-------------------------------------------

1) FULL MOTORCYCLE RENDER:
• If the user mentions: "full bike", "complete motorcycle", "side view", "3/4 angle", "studio shot", "track bike".
• Render the entire motorcycle with accurate proportions.
• Professional catalog-level lighting.
• Clean neutral background.

2) EXPLODED FAIRING KIT:
• If the user mentions: "exploded", "fairing kit", "all parts", "separate pieces".
• Show only the fairing components, no wheels, no frame, no engine.
• Symmetrical exploded layout.
• Studio lighting.

3) SINGLE PART RENDER:
• If the user mentions a single part (e.g., "side panel", "tail", "windscreen").
• Render a single floating product shot.

If the user's intention is unclear:
→ Choose the interpretation with the highest commercial value and clarity.

-------------------------------------------
GLOBAL STYLE RULES
-------------------------------------------
• Hyper-realistic ABS or carbon fiber surfaces
• Sharp geometry with clean contours
• Subtle reflections
• High-end e-commerce studio lighting
• Neutral black/white/grey background
• No text, no watermarks, no artifacts
• No weird shapes or melted components
• Respect real motorcycle proportions for the specified model and year
• Final render must look like a premium commercial product image"#;

const RENDERING_REQUIREMENTS: &str = "• Commercial studio-quality image
• No distortions or unrealistic geometry
• Respect real motorcycle body shape and proportions
• Only produce ONE final PNG image";

const SECTION_RULE: &str = "-------------------------------------------";

pub const FALLBACK_MODEL: &str = "unspecified";
pub const FALLBACK_YEAR_RANGE: &str = "unspecified";
pub const FALLBACK_STYLE_NAME: &str = "Custom Edition";
pub const FALLBACK_PRIMARY_COLORS: &str = "unspecified – follow user input";
pub const FALLBACK_ACCENTS: &str = "use as appropriate";
pub const FALLBACK_FINISH: &str = "glossy ABS plastic";
pub const FALLBACK_BRAND_LOGOS: &str = "use brand markings if appropriate";
pub const FALLBACK_DESCRIPTION: &str =
    "Use best judgment for a clean, attractive commercial render.";

/// Build the prompt sent upstream from `system_prefix` and the request fields.
pub fn compose_prompt(system_prefix: &str, request: &RenderRequest) -> String {
    fn field_or<'a>(field: &'a Option<String>, fallback: &'a str) -> &'a str {
        field.as_deref().unwrap_or(fallback)
    }

    format!(
        "{prefix}

{rule}
USER-SPECIFIC MOTORCYCLE DETAILS
{rule}
Motorcycle model: {model}
Year range: {year_range}
Fairing / Style name: {style_name}
Primary colors: {primary_colors}
Accent decals: {accents}
Material finish: {finish}
Brand logos: {brand_logos}

{rule}
USER DESCRIPTION
{rule}
{description}

{rule}
RENDERING REQUIREMENTS
{rule}
{requirements}
",
        prefix = system_prefix,
        rule = SECTION_RULE,
        model = field_or(&request.model, FALLBACK_MODEL),
        year_range = field_or(&request.year_range, FALLBACK_YEAR_RANGE),
        style_name = field_or(&request.style_name, FALLBACK_STYLE_NAME),
        primary_colors = field_or(&request.primary_colors, FALLBACK_PRIMARY_COLORS),
        accents = field_or(&request.accents, FALLBACK_ACCENTS),
        finish = field_or(&request.finish, FALLBACK_FINISH),
        brand_logos = field_or(&request.brand_logos, FALLBACK_BRAND_LOGOS),
        description = field_or(&request.prompt, FALLBACK_DESCRIPTION),
        requirements = RENDERING_REQUIREMENTS,
    )
}
