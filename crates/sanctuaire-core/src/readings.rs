use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reading {
    pub source: &'static str,
    pub content: &'static str,
}

pub const READINGS: &[Reading] = &[
    Reading {
        source: "Psaume 23",
        content: "L'Éternel est mon berger : je ne manquerai de rien. Il me fait reposer \
                  dans de verts pâturages, Il me dirige près des eaux paisibles.",
    },
    Reading {
        source: "Jean 15, 9",
        content: "Comme le Père m'a aimé, moi aussi je vous ai aimés. Demeurez dans mon amour.",
    },
    Reading {
        source: "Saint Augustin",
        content: "Tu nous as faits pour toi, Seigneur, et notre cœur est sans repos tant \
                  qu'il ne demeure en toi.",
    },
    Reading {
        source: "Matthieu 11, 28",
        content: "Venez à moi, vous tous qui êtes fatigués et chargés, et je vous donnerai \
                  du repos.",
    },
    Reading {
        source: "Sainte Thérèse d'Avila",
        content: "L'oraison n'est à mon avis qu'un commerce intime d'amitié où l'on \
                  s'entretient souvent seul à seul avec ce Dieu dont on se sait aimé.",
    },
    Reading {
        source: "Isaïe 43, 1",
        content: "Ne crains rien, car je te rachète, Je t'appelle par ton nom : tu es à moi !",
    },
];

/// Verse shown before a session starts.
pub const WELCOME: Reading = Reading {
    source: "Ap 3,20",
    content: "Voici que je me tiens à la porte, et je frappe. Si quelqu’un entend ma voix \
              et ouvre la porte, j’entrerai chez lui ; je prendrai mon repas avec lui, et \
              lui avec moi.",
};

pub fn random_reading() -> Reading {
    random_reading_with(&mut rand::thread_rng())
}

pub fn random_reading_with<R: Rng + ?Sized>(rng: &mut R) -> Reading {
    READINGS.choose(rng).copied().unwrap_or(WELCOME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_reading_comes_from_list() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let r = random_reading_with(&mut rng);
            assert!(READINGS.contains(&r));
        }
    }
}
