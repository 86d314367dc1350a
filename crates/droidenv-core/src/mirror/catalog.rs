//! Built-in mirror list.

use droidenv_schema::{Candidate, Region};

const OFFICIAL: &[(&str, &str)] = &[
    ("Termux CDN", "https://packages-cf.termux.dev/apt"),
    ("Termux", "https://packages.termux.dev/apt"),
];

const REGIONAL: &[(Region, &str, &str)] = &[
    (Region::China, "Tsinghua TUNA", "https://mirrors.tuna.tsinghua.edu.cn/termux/apt"),
    (Region::China, "USTC", "https://mirrors.ustc.edu.cn/termux/apt"),
    (Region::China, "BFSU", "https://mirrors.bfsu.edu.cn/termux/apt"),
    (Region::Europe, "Grimler (SE)", "https://grimler.se"),
    (Region::Europe, "FAU Erlangen (DE)", "https://ftp.fau.de/termux"),
    (Region::Asia, "Albony (IN)", "https://mirror.albony.xyz/termux"),
    (Region::Asia, "NJU (CN/Asia)", "https://mirror.nju.edu.cn/termux/apt"),
    (Region::Asia, "Kakao (KR)", "https://mirror.kakao.com/termux/apt"),
];

/// Candidates worth probing for `region`: official tier first, then that
/// region's mirrors. [`Region::Global`] yields only the official tier.
pub fn candidates_for(region: Region) -> Vec<Candidate> {
    let official = OFFICIAL
        .iter()
        .map(|(label, url)| Candidate::official(*label, *url));
    let regional = REGIONAL
        .iter()
        .filter(|(r, _, _)| *r == region && region != Region::Global)
        .map(|(r, label, url)| Candidate::regional(*label, *url, *r));
    official.chain(regional).collect()
}

/// Every known candidate, official tier first.
pub fn all_candidates() -> Vec<Candidate> {
    OFFICIAL
        .iter()
        .map(|(label, url)| Candidate::official(*label, *url))
        .chain(
            REGIONAL
                .iter()
                .map(|(r, label, url)| Candidate::regional(*label, *url, *r)),
        )
        .collect()
}
