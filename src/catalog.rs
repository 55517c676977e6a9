//! Static reference data: breeders, known varieties and the choices offered
//! when recording care.

use crate::models::Variety;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breeder {
    pub name: &'static str,
    pub varieties: &'static [&'static str],
}

/// Defaults for a known variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryEntry {
    pub name: &'static str,
    /// Disease-resistance tier, 0 (most resistant) to 3.
    pub rose_type: i64,
    pub feature: &'static str,
}

/// A coded choice with a display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub code: &'static str,
    pub label: &'static str,
}

impl Choice {
    /// The label without its parenthesized translation.
    pub fn short_label(&self) -> &'static str {
        self.label.split(" (").next().unwrap_or(self.label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Disease,
    Pest,
    Prevention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Issue {
    pub label: &'static str,
    pub kind: IssueKind,
}

pub const BREEDERS: &[Breeder] = &[
    Breeder {
        name: "ロサオリエンティス (Rosa Orientis)",
        varieties: &[
            "シェエラザード",
            "オデュッセイア",
            "ダフネ",
            "マイローズ",
            "シャリマー",
            "リュシオール",
            "トロイメライ",
            "プラリエ",
            "リラ",
            "カミーユ",
        ],
    },
    Breeder {
        name: "デビットオースチン (David Austin)",
        varieties: &[
            "オリビア・ローズ・オースチン",
            "ボスコベル",
            "ガブリエル・オーク",
            "ユーステイシア・ヴァイ",
            "デスデモーナ",
            "レディ・エマ・ハミルトン",
            "クイーン・オブ・スウェーデン",
            "ジュード・ジ・オブスキュア",
            "ゴールデン・セレブレーション",
            "プリンセス・アレキサンドラ・オブ・ケント",
        ],
    },
    Breeder {
        name: "河本バラ園 (Kawamoto Rose)",
        varieties: &[
            "ガブリエル",
            "ルシファー",
            "ラ・マリエ",
            "プリュム",
            "サフィレット",
            "コフレ",
            "シュシュ",
            "ミスティ・パープル",
        ],
    },
    Breeder {
        name: "ローズトメルスリー (Rose de Mulsanne)",
        varieties: &[
            "サマルカンド",
            "コフレ",
            "プティ・プランス",
            "エール",
            "カタン",
            "ローブ・ア・ラ・フランセーズ",
        ],
    },
    Breeder {
        name: "京成バラ園 (Keisei Rose)",
        varieties: &[
            "快挙",
            "恋結び",
            "しののめ",
            "ローズうらら",
            "薫乃",
            "桃香",
            "結愛",
            "ほのか",
            "アミ・ロマンティカ",
        ],
    },
    Breeder {
        name: "メイアン (Meilland)",
        varieties: &[
            "ピエール・ドゥ・ロンサール",
            "パパ・メイアン",
            "ボレロ",
            "マイ・ガーデン",
            "レオナルド・ダ・ヴィンチ",
            "ミミ・エデン",
        ],
    },
    Breeder {
        name: "デルバール (Delbard)",
        varieties: &[
            "ナエマ",
            "クロード・モネ",
            "ラ・パリジェンヌ",
            "ローズ・ポンパドゥール",
            "エドゥアール・マネ",
            "シャンテ・ロゼ・ミサト",
            "ソレイユ・ヴァルティカル",
        ],
    },
    Breeder {
        name: "タンタウ (Tantau)",
        varieties: &[
            "ノスタルジー",
            "アスコット",
            "レイニー・ブルー",
            "アスピリン・ローズ",
            "バイランド",
            "カフェ",
        ],
    },
];

pub const ROSE_LIBRARY: &[LibraryEntry] = &[
    LibraryEntry {
        name: "シェエラザード",
        rose_type: 1,
        feature: "Deep pink, pointed petals, strong damask scent. Very distinct.",
    },
    LibraryEntry {
        name: "オデュッセイア",
        rose_type: 2,
        feature: "Bluish crimson, wavy petals, rich damask fragrance. Climber potential.",
    },
    LibraryEntry {
        name: "ダフネ",
        rose_type: 1,
        feature: "Soft pink ruffles, fades to green. Excellent disease resistance.",
    },
    LibraryEntry {
        name: "マイローズ",
        rose_type: 0,
        feature: "Type 0 resistance! Pure red, compact, continuous bloomer.",
    },
    LibraryEntry {
        name: "シャリマー",
        rose_type: 0,
        feature: "Soft pink to white gradient. Highly resistant (Type 0) and fragrant.",
    },
    LibraryEntry {
        name: "リュシオール",
        rose_type: 0,
        feature: "Bright yellow, Type 0. Compact and disease resistant.",
    },
    LibraryEntry {
        name: "トロイメライ",
        rose_type: 0,
        feature: "Pink apricot blend. Very fragrant and highly resistant.",
    },
    LibraryEntry {
        name: "リラ",
        rose_type: 0,
        feature: "Lilac purple. Type 0. Deep fragrance and classic shape.",
    },
    LibraryEntry {
        name: "オリビア・ローズ・オースチン",
        rose_type: 1,
        feature: "Soft pink cupped rosettes. Fruity fragrance. Extremely healthy.",
    },
    LibraryEntry {
        name: "ボスコベル",
        rose_type: 2,
        feature: "Rich salmon-pink. Complex myrrh and hawthorn fragrance.",
    },
    LibraryEntry {
        name: "ガブリエル・オーク",
        rose_type: 1,
        feature: "Deep pink, many petalled rosette. Strong fruity fragrance.",
    },
    LibraryEntry {
        name: "ユーステイシア・ヴァイ",
        rose_type: 2,
        feature: "Soft apricot-pink. Intense fruity fragrance.",
    },
    LibraryEntry {
        name: "デスデモーナ",
        rose_type: 1,
        feature: "Peachy pink buds opening to white. Old rose fragrance.",
    },
    LibraryEntry {
        name: "レディ・エマ・ハミルトン",
        rose_type: 2,
        feature: "Tangerine orange-yellow. Strong fruity scent. Dark bronze foliage.",
    },
    LibraryEntry {
        name: "クイーン・オブ・スウェーデン",
        rose_type: 2,
        feature: "Soft pink, upright growth. Myrrh fragrance. Very elegant.",
    },
    LibraryEntry {
        name: "ジュード・ジ・オブスキュア",
        rose_type: 3,
        feature: "Buff yellow. Extremely strong citrus/guava fragrance.",
    },
    LibraryEntry {
        name: "ガブリエル",
        rose_type: 3,
        feature: "Pure white with purple center. Heavenly scent but requires care (Type 3).",
    },
    LibraryEntry {
        name: "ルシファー",
        rose_type: 3,
        feature: "Pale lilac, mysterious beauty. Needs protection from pests/disease.",
    },
    LibraryEntry {
        name: "ラ・マリエ",
        rose_type: 2,
        feature: "Frilly pink petals, distinct scent. 'The Bride'.",
    },
    LibraryEntry {
        name: "サフィレット",
        rose_type: 2,
        feature: "White with mauve shading. Unique vintage look.",
    },
    LibraryEntry {
        name: "コフレ",
        rose_type: 2,
        feature: "Mauve/Green outer petals. Excellent vase life. Very popular.",
    },
    LibraryEntry {
        name: "ナエマ",
        rose_type: 2,
        feature: "Soft pink, cup-shaped. Intense fruity/citrus fragrance. Vigorous climber.",
    },
    LibraryEntry {
        name: "クロード・モネ",
        rose_type: 2,
        feature: "Pink with yellow stripes. Very painterly. Good scent.",
    },
    LibraryEntry {
        name: "ラ・パリジェンヌ",
        rose_type: 1,
        feature: "Orange, yellow, pink blend. Very free flowering and healthy.",
    },
    LibraryEntry {
        name: "エドゥアール・マネ",
        rose_type: 2,
        feature: "Light yellow with pink stripes. Fruity fragrance. Climber.",
    },
    LibraryEntry {
        name: "ピエール・ドゥ・ロンサール",
        rose_type: 2,
        feature: "Creamy white with pink edge. World's favorite climber. Mild scent.",
    },
    LibraryEntry {
        name: "ボレロ",
        rose_type: 1,
        feature: "Pure white, packed with petals. Strong fruity fragrance. Compact.",
    },
    LibraryEntry {
        name: "レオナルド・ダ・ヴィンチ",
        rose_type: 1,
        feature: "Bengal pink. Very tough, rain resistant. Mild scent.",
    },
    LibraryEntry {
        name: "快挙",
        rose_type: 1,
        feature: "Bright yellow, large flowers. Good resistance.",
    },
    LibraryEntry {
        name: "薫乃",
        rose_type: 2,
        feature: "Soft cream/pink. Incredible fragrance (Perfume industry standard).",
    },
    LibraryEntry {
        name: "ローズうらら",
        rose_type: 1,
        feature: "Shocking pink. Extremely robust and floriferous.",
    },
    LibraryEntry {
        name: "レイニー・ブルー",
        rose_type: 2,
        feature: "Violet-blue clusters. Gentle climber. Very popular in Japan.",
    },
    LibraryEntry {
        name: "ノスタルジー",
        rose_type: 1,
        feature: "Cherry red edges, creamy white center. Distinct bi-color.",
    },
];

pub const FERTILIZERS: &[Choice] = &[
    Choice { code: "VITALIZER", label: "活力剤 (Vitalizer)" },
    Choice { code: "SOLID", label: "固形肥料 (Solid)" },
    Choice { code: "LIQUID", label: "液体肥料 (Liquid)" },
];

pub const TRANSPLANT_TYPES: &[Choice] = &[
    Choice { code: "TRANSPLANT", label: "植え替え (Repotting)" },
    Choice { code: "POT_UP", label: "鉢増し (Pot Up)" },
    Choice { code: "SOIL_RENEWAL", label: "用土替え (Soil Renewal)" },
    Choice { code: "GROUND", label: "地植え (Planting in Ground)" },
];

pub const SOIL_TYPES: &[Choice] = &[
    Choice { code: "PREMIUM_ROSE", label: "プレミアムローズ培養土 (Premium)" },
    Choice { code: "BIOGOLD", label: "バイオゴールドの土 (Biogold)" },
    Choice { code: "AUSTIN", label: "オースチンバラの土 (Austin)" },
    Choice { code: "BARANOIE", label: "バラの家 培養土 (Baranoie)" },
    Choice { code: "HYPONEX", label: "ハイポネックス バラの培養土" },
    Choice { code: "AKADAMA", label: "赤玉土 (Akadama)" },
    Choice { code: "COMPOST", label: "堆肥 (Compost)" },
    Choice { code: "PEAT", label: "ピートモス (Peat Moss)" },
    Choice { code: "OTHER", label: "その他 (Other)" },
];

pub const ISSUES: &[Issue] = &[
    Issue { label: "黒星病 (Black Spot)", kind: IssueKind::Disease },
    Issue { label: "うどんこ病 (Mildew)", kind: IssueKind::Disease },
    Issue { label: "アブラムシ (Aphids)", kind: IssueKind::Pest },
    Issue { label: "コガネムシ (Beetles)", kind: IssueKind::Pest },
    Issue { label: "チュウレンジハバチ (Sawfly)", kind: IssueKind::Pest },
    Issue { label: "カイガラムシ (Scale)", kind: IssueKind::Pest },
    Issue { label: "薬剤散布 (Spray Prevention)", kind: IssueKind::Prevention },
];

pub fn library_entry(name: &str) -> Option<&'static LibraryEntry> {
    ROSE_LIBRARY.iter().find(|entry| entry.name == name)
}

fn find_choice(choices: &'static [Choice], code: &str) -> Option<&'static Choice> {
    choices.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

pub fn fertilizer(code: &str) -> Option<&'static Choice> {
    find_choice(FERTILIZERS, code)
}

pub fn transplant_type(code: &str) -> Option<&'static Choice> {
    find_choice(TRANSPLANT_TYPES, code)
}

pub fn soil_type(code: &str) -> Option<&'static Choice> {
    find_choice(SOIL_TYPES, code)
}

/// Looks an issue up by its full label or by the English name in parentheses.
pub fn issue(query: &str) -> Option<&'static Issue> {
    let query = query.trim();
    ISSUES.iter().find(|issue| {
        issue.label == query
            || issue
                .label
                .split_once(" (")
                .is_some_and(|(_, en)| en.trim_end_matches(')').eq_ignore_ascii_case(query))
    })
}

/// Fills `roseType` and `feature` from the library when the name is known.
pub fn apply_library_defaults(variety: &mut Variety) {
    if let Some(entry) = library_entry(&variety.name) {
        variety.rose_type = Some(entry.rose_type);
        variety.feature = Some(entry.feature.to_string());
    }
}
